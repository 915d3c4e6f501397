//! Key-value store backing the structured metadata tier of the utterance cache.
//!
//! Rows are plain byte values under string keys; ordering of [`KVStore::scan`]
//! results is lexicographic by key, which the utterance layer relies on for
//! zero-padded numeric key components. [`MemoryStore`] is meant for tests and
//! ephemeral caches, [`RedbStore`] persists to a single redb file.

pub mod memory;
pub mod redb;

use std::fmt;
use thiserror::Error;

/// Errors that can occur in KV store operations.
#[derive(Error, Debug)]
pub enum KVError {
    #[error("kv: not found")]
    NotFound,

    #[error("kv: storage error: {0}")]
    Storage(String),

    #[error("kv: serialization error: {0}")]
    Serialization(String),
}

/// Result type for KV operations.
pub type KVResult<T> = Result<T, KVError>;

/// Key-value store trait.
///
/// Implementations must be safe to share between threads. Every method is a
/// self-contained unit of work; no handle or lock outlives the call.
pub trait KVStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>>;

    /// Set a key-value pair.
    fn set(&self, key: &str, value: &[u8]) -> KVResult<()>;

    /// Delete a key. Deleting an absent key succeeds.
    fn delete(&self, key: &str) -> KVResult<()>;

    /// Scan for keys with a given prefix, sorted by key.
    fn scan(&self, prefix: &str) -> KVResult<Vec<(String, Vec<u8>)>>;

    /// Set multiple key-value pairs in one atomic write.
    fn batch_set(&self, entries: &[(&str, &[u8])]) -> KVResult<()>;

    /// Delete multiple keys in one atomic write.
    fn batch_delete(&self, keys: &[&str]) -> KVResult<()>;

    /// Atomically increment the counter stored under `key` and return the new
    /// value. A missing counter starts at zero, so the first call returns 1.
    fn increment(&self, key: &str) -> KVResult<u64>;
}

impl fmt::Debug for dyn KVStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KVStore {{ ... }}")
    }
}

/// Decode a counter value written by [`KVStore::increment`].
pub(crate) fn decode_counter(data: &[u8]) -> KVResult<u64> {
    let bytes: [u8; 8] = data
        .try_into()
        .map_err(|_| KVError::Serialization(format!("counter has {} bytes, want 8", data.len())))?;
    Ok(u64::from_be_bytes(bytes))
}

// Re-export the implementations
pub use memory::MemoryStore;
pub use redb::RedbStore;
