//! Sentence segmentation and segment identity.
//!
//! Cleaned page text arrives as a sequence of [`Item`]s: text [`Fragment`]s
//! tagged with the path of the node they came from, interleaved with
//! [`Item::Break`] markers at block boundaries. [`segment_sentences`] turns
//! them into [`Segment`]s, one per sentence, and [`Segment::hash`] gives each
//! segment the identity used as utterance cache key.
//!
//! # Example
//!
//! ```rust
//! use recite_segment::{Fragment, segment_fragments};
//!
//! let segments = segment_fragments(&[Fragment::new("Sentence 1. Sentence 2.", "./p/text()")]);
//! assert_eq!(segments.len(), 2);
//! assert_eq!(segments[1].text(), "Sentence 2.");
//! assert_eq!(segments[1].start_offset, 12);
//! ```

mod hash;
mod segmenter;
mod types;

pub use hash::{segment_hash, text_hash};
pub use segmenter::{segment_fragments, segment_sentences};
pub use types::{Fragment, Item, Segment, find_segment};

#[cfg(test)]
mod tests;
