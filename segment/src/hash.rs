//! Segment identity.
//!
//! The identity is the lowercase hex SHA-256 of the UTF-8 segment text. Origin
//! paths are left out, so the same sentence at another place in the document,
//! or in another revision of it, maps to the same hash.

use sha2::{Digest, Sha256};

use crate::types::Fragment;

/// Hash the concatenated text of `content`.
pub fn segment_hash(content: &[Fragment]) -> String {
    let mut hasher = Sha256::new();
    for fragment in content {
        hasher.update(fragment.text.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Hash a plain segment text.
pub fn text_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
