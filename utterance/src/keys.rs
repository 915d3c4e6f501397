//! Storage layout of the utterance store.
//!
//! Metadata tier (KV):
//!
//! ```text
//! utt:seq                                         → u64 counter (surrogate ids)
//! utt:row:{id:020}                                → msgpack UtteranceRow
//! utt:key:{scope}␟{page:020}␟{lang}␟{voice}␟{hash}␟{id:020} → empty lookup entry
//! utt:page:{page:020}␟{id:020}                    → empty page index entry
//! utt:voice:{lang}␟{voice}␟{id:020}               → empty language/voice index entry
//! ```
//!
//! The row and its three index entries are written and deleted together.
//!
//! `␟` is the ASCII unit separator (0x1F); scopes are consumer URLs and
//! contain ':'. The scope component is `-` for local requests and `+{scope}`
//! otherwise, so that no scope and an empty scope stay apart.
//!
//! Blob tier, below the configured container:
//!
//! ```text
//! {container}{dir}{id}.opus   → audio
//! {container}{dir}{id}.json   → synthesis metadata (tokens)
//! ```
//!
//! where `{dir}` is derived from the id by [`utterance_dir`].

use crate::types::UtteranceKey;

/// Separator between lookup key components.
pub const SEP: char = '\x1F';

/// Counter handing out utterance ids.
pub const SEQ_KEY: &str = "utt:seq";

/// Prefix of all metadata rows.
pub const ROW_PREFIX: &str = "utt:row:";

/// Suffix of audio blobs.
pub const AUDIO_SUFFIX: &str = ".opus";

/// Suffix of synthesis metadata blobs.
pub const METADATA_SUFFIX: &str = ".json";

/// KV key of the metadata row for `id`.
/// Zero-padded so that a scan returns rows in id order.
pub fn row_key(id: u64) -> String {
    format!("{ROW_PREFIX}{id:020}")
}

fn scope_component(scope: Option<&str>) -> String {
    match scope {
        None => "-".to_string(),
        Some(s) => format!("+{s}"),
    }
}

/// Prefix of all lookup entries for one logical key.
pub fn lookup_prefix(key: &UtteranceKey) -> String {
    format!(
        "utt:key:{scope}{SEP}{page:020}{SEP}{lang}{SEP}{voice}{SEP}{hash}{SEP}",
        scope = scope_component(key.scope.as_deref()),
        page = key.page_id,
        lang = key.language,
        voice = key.voice,
        hash = key.segment_hash,
    )
}

/// Lookup entry pointing at the row for `id`.
pub fn lookup_key(key: &UtteranceKey, id: u64) -> String {
    format!("{}{id:020}", lookup_prefix(key))
}

/// Prefix of the page index entries of `page_id`.
pub fn page_index_prefix(page_id: u64) -> String {
    format!("utt:page:{page_id:020}{SEP}")
}

/// Page index entry for the row `id`.
pub fn page_index_key(page_id: u64, id: u64) -> String {
    format!("{}{id:020}", page_index_prefix(page_id))
}

/// Prefix of the language/voice index entries. Without `voice` the prefix
/// covers every voice of `language`.
pub fn voice_index_prefix(language: &str, voice: Option<&str>) -> String {
    match voice {
        Some(voice) => format!("utt:voice:{language}{SEP}{voice}{SEP}"),
        None => format!("utt:voice:{language}{SEP}"),
    }
}

/// Language/voice index entry for the row `id`.
pub fn voice_index_key(language: &str, voice: &str, id: u64) -> String {
    format!("{}{id:020}", voice_index_prefix(language, Some(voice)))
}

/// Every KV key belonging to the row `id` with `key`, row first.
pub fn row_keys(key: &UtteranceKey, id: u64) -> [String; 4] {
    [
        row_key(id),
        lookup_key(key, id),
        page_index_key(key.page_id, id),
        voice_index_key(&key.language, &key.voice, id),
    ]
}

/// Parse the id at the end of a lookup or index entry.
pub fn parse_lookup_id(lookup: &str) -> Option<u64> {
    lookup.rsplit(SEP).next()?.parse().ok()
}

/// Directory for the blobs of utterance `id`.
///
/// One directory level per leading digit, leaving out the last three digits,
/// so that no directory holds more than 1000 utterances (2000 files) and 10
/// subdirectories.
///
/// ```text
/// 1       → /
/// 123     → /
/// 1234    → /1/
/// 12345   → /1/2/
/// 1234567 → /1/2/3/4/
/// ```
pub fn utterance_dir(id: u64) -> String {
    let digits = id.to_string();
    let levels = digits.len().saturating_sub(3);
    let mut path = String::from("/");
    for digit in digits.chars().take(levels) {
        path.push(digit);
        path.push('/');
    }
    path
}

/// Directory holding the blobs of `id` within `container`.
pub fn blob_dir(container: &str, id: u64) -> String {
    format!("{container}{}", utterance_dir(id))
}

/// Path of the audio blob for `id`.
pub fn audio_path(container: &str, id: u64) -> String {
    format!("{}{id}{AUDIO_SUFFIX}", blob_dir(container, id))
}

/// Path of the synthesis metadata blob for `id`.
pub fn metadata_path(container: &str, id: u64) -> String {
    format!("{}{id}{METADATA_SUFFIX}", blob_dir(container, id))
}

/// Recover the utterance id from a blob path written by this store.
pub fn parse_blob_id(path: &str) -> Option<u64> {
    let name = path.rsplit('/').next()?;
    let stem = name
        .strip_suffix(AUDIO_SUFFIX)
        .or_else(|| name.strip_suffix(METADATA_SUFFIX))?;
    stem.parse().ok()
}

/// Check that a key component cannot break the lookup key layout.
pub(crate) fn validate_component(name: &str, value: &str) -> Result<(), String> {
    if value.contains(SEP) {
        return Err(format!("{name} {value:?} contains the key separator"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(scope: Option<&str>) -> UtteranceKey {
        UtteranceKey {
            scope: scope.map(str::to_string),
            page_id: 42,
            language: "en".into(),
            voice: "en-voice".into(),
            segment_hash: "abc".into(),
        }
    }

    #[test]
    fn test_utterance_dir() {
        assert_eq!(utterance_dir(1), "/");
        assert_eq!(utterance_dir(12), "/");
        assert_eq!(utterance_dir(123), "/");
        assert_eq!(utterance_dir(1234), "/1/");
        assert_eq!(utterance_dir(12345), "/1/2/");
        assert_eq!(utterance_dir(123456), "/1/2/3/");
        assert_eq!(utterance_dir(1234567), "/1/2/3/4/");
    }

    #[test]
    fn test_blob_paths() {
        assert_eq!(audio_path("utterances", 7), "utterances/7.opus");
        assert_eq!(metadata_path("utterances", 123456), "utterances/1/2/3/123456.json");
        assert_eq!(parse_blob_id("utterances/1/2/3/123456.json"), Some(123456));
        assert_eq!(parse_blob_id("utterances/1/1234.opus"), Some(1234));
        assert_eq!(parse_blob_id("utterances/readme.txt"), None);
        assert_eq!(parse_blob_id("utterances/x.opus"), None);
    }

    #[test]
    fn test_row_key_lexicographic_order() {
        assert!(row_key(9) < row_key(10));
        assert_eq!(row_key(1), "utt:row:00000000000000000001");
    }

    #[test]
    fn test_lookup_key_round_trip() {
        let k = lookup_key(&key(Some("https://consumer.url/w")), 1234);
        assert!(k.starts_with(&lookup_prefix(&key(Some("https://consumer.url/w")))));
        assert_eq!(parse_lookup_id(&k), Some(1234));
    }

    #[test]
    fn test_lookup_prefix_distinguishes_scopes() {
        let none = lookup_prefix(&key(None));
        let empty = lookup_prefix(&key(Some("")));
        let other = lookup_prefix(&key(Some("https://a")));
        assert_ne!(none, empty);
        assert_ne!(none, other);
        assert!(!other.starts_with(&none));
    }

    #[test]
    fn test_index_keys() {
        let k = page_index_key(42, 7);
        assert!(k.starts_with(&page_index_prefix(42)));
        assert!(!k.starts_with(&page_index_prefix(4)));
        assert_eq!(parse_lookup_id(&k), Some(7));

        let v = voice_index_key("en", "anna", 9);
        assert!(v.starts_with(&voice_index_prefix("en", Some("anna"))));
        assert!(v.starts_with(&voice_index_prefix("en", None)));
        assert!(!v.starts_with(&voice_index_prefix("en", Some("ann"))));
        assert!(!v.starts_with(&voice_index_prefix("e", None)));
        assert_eq!(parse_lookup_id(&v), Some(9));
    }

    #[test]
    fn test_row_keys() {
        let keys = row_keys(&key(None), 3);
        assert_eq!(keys[0], row_key(3));
        assert_eq!(keys[1], lookup_key(&key(None), 3));
        assert_eq!(keys[2], page_index_key(42, 3));
        assert_eq!(keys[3], voice_index_key("en", "en-voice", 3));
    }

    #[test]
    fn test_validate_component() {
        assert!(validate_component("voice", "en-voice").is_ok());
        assert!(validate_component("voice", "en\u{1F}voice").is_err());
    }
}
