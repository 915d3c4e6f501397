use serde::{Deserialize, Serialize};

use crate::hash::segment_hash;

/// A slice of cleaned source text and the locator of the node it came from.
///
/// The path is never interpreted here, only carried along so that callers can
/// map a segment back onto the original document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    #[serde(default)]
    pub path: String,
}

impl Fragment {
    pub fn new(text: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            path: path.into(),
        }
    }

    /// A fragment without an origin path.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, "")
    }
}

/// Input element of the segmenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// Text belonging to the current segment.
    Text(Fragment),
    /// Block-level boundary, such as between a heading and a paragraph.
    /// Closes the open segment even without sentence final punctuation.
    Break,
}

impl From<Fragment> for Item {
    fn from(f: Fragment) -> Self {
        Item::Text(f)
    }
}

/// One sentence worth of fragments.
///
/// `start_offset` is the character offset of the first character of the
/// segment within the first fragment's source node, `end_offset` the offset of
/// the last character within the last fragment's source node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub content: Vec<Fragment>,
    #[serde(rename = "startOffset")]
    pub start_offset: usize,
    #[serde(rename = "endOffset")]
    pub end_offset: usize,
}

impl Segment {
    /// The segment text, i.e. all fragment texts concatenated.
    pub fn text(&self) -> String {
        self.content.iter().map(|f| f.text.as_str()).collect()
    }

    /// Content hash identifying this segment in the utterance cache.
    pub fn hash(&self) -> String {
        segment_hash(&self.content)
    }
}

/// Find the segment with the given hash.
pub fn find_segment<'a>(segments: &'a [Segment], hash: &str) -> Option<&'a Segment> {
    segments.iter().find(|s| s.hash() == hash)
}
