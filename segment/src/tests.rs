//! Tests across segmentation and hashing.

use super::*;

#[test]
fn test_hash_equal_across_fragmentation() {
    let a = segment_fragments(&[Fragment::new("A sentence spoken twice.", "x")]);
    let b = segment_fragments(&[
        Fragment::new("A sentence ", "y"),
        Fragment::new("spoken", "y/b"),
        Fragment::new(" twice.", "y"),
    ]);
    assert_eq!(a.len(), 1);
    assert_eq!(b.len(), 1);
    assert_ne!(a[0].content, b[0].content);
    assert_eq!(a[0].hash(), b[0].hash());
}

#[test]
fn test_hash_differs_for_changed_sentence() {
    let old = segment_fragments(&[Fragment::text("The cat sat.")]);
    let new = segment_fragments(&[Fragment::text("The cat sat down.")]);
    assert_ne!(old[0].hash(), new[0].hash());
}

#[test]
fn test_unchanged_sentence_keeps_hash_across_revisions() {
    let rev1 = segment_fragments(&[Fragment::text("Intro. Stable sentence.")]);
    let rev2 = segment_fragments(&[Fragment::text("New intro here. Stable sentence.")]);
    assert_eq!(rev1[1].hash(), rev2[1].hash());
    // Offsets differ, identity does not.
    assert_ne!(rev1[1].start_offset, rev2[1].start_offset);
}

#[test]
fn test_find_segment() {
    let segments = segment_fragments(&[Fragment::text("One. Two. Three.")]);
    let wanted = segments[1].hash();

    let found = find_segment(&segments, &wanted).unwrap();
    assert_eq!(found.text(), "Two.");

    assert!(find_segment(&segments, &text_hash("Four.")).is_none());
}

#[test]
fn test_segment_serializes_offsets_in_camel_case() {
    let segments = segment_fragments(&[Fragment::new("Hi.", "./p")]);
    let json = serde_json::to_value(&segments[0]).unwrap();
    assert_eq!(json["startOffset"], 0);
    assert_eq!(json["endOffset"], 2);
    assert_eq!(json["content"][0]["path"], "./p");
}
