//! Blob store backing the binary tier of the utterance cache.
//!
//! Blobs are addressed by slash-separated logical paths such as
//! `utterances/1/2/1234.opus`. The first path component is the container.
//! [`MemoryBlobStore`] keeps everything in a map, [`FsBlobStore`] maps the
//! logical path onto a directory tree below a root directory.

pub mod fs;
pub mod memory;

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur in blob store operations.
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("blob: invalid path: {0:?}")]
    InvalidPath(String),

    #[error("blob: io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("blob: storage error: {0}")]
    Storage(String),
}

/// Result type for blob operations.
pub type BlobResult<T> = Result<T, BlobError>;

/// A blob found by [`BlobStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobInfo {
    /// Logical path of the blob.
    pub path: String,
    /// Last modification time.
    pub modified: DateTime<Utc>,
}

/// Blob store trait.
pub trait BlobStore: Send + Sync {
    /// Make sure the directory `dir` can receive blobs.
    fn prepare(&self, dir: &str) -> BlobResult<()>;

    /// Create or overwrite the blob at `path`.
    fn put(&self, path: &str, data: &[u8]) -> BlobResult<()>;

    /// Read a blob. Returns `None` if it does not exist.
    fn get(&self, path: &str) -> BlobResult<Option<Vec<u8>>>;

    /// Test whether a blob exists.
    fn exists(&self, path: &str) -> BlobResult<bool>;

    /// Delete a blob. Returns `false` if there was nothing to delete.
    fn delete(&self, path: &str) -> BlobResult<bool>;

    /// Remove empty directories from `dir` upwards, stopping at the container.
    fn clean(&self, dir: &str) -> BlobResult<()>;

    /// List every blob below `dir`, recursively, sorted by path.
    fn list(&self, dir: &str) -> BlobResult<Vec<BlobInfo>>;
}

impl fmt::Debug for dyn BlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobStore {{ ... }}")
    }
}

/// Split a logical path into its components, rejecting anything that could
/// escape the store (`..`, `.`, empty components, backslashes).
pub fn path_components(path: &str) -> BlobResult<Vec<&str>> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(BlobError::InvalidPath(path.to_string()));
    }
    let parts: Vec<&str> = trimmed.split('/').collect();
    for part in &parts {
        if part.is_empty() || *part == "." || *part == ".." || part.contains('\\') {
            return Err(BlobError::InvalidPath(path.to_string()));
        }
    }
    Ok(parts)
}

/// Normalize a logical path: no leading, trailing or doubled slashes.
pub fn normalize(path: &str) -> BlobResult<String> {
    Ok(path_components(path)?.join("/"))
}

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;
