//! In-memory blob store implementation for testing.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::{BlobInfo, BlobResult, BlobStore, normalize};

struct Entry {
    data: Vec<u8>,
    modified: DateTime<Utc>,
}

/// An in-memory blob store. Directories are implicit.
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<BTreeMap<String, Entry>>>,
}

impl MemoryBlobStore {
    /// Create a new empty blob store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a blob with an explicit modification time.
    pub fn put_at(&self, path: &str, data: &[u8], modified: DateTime<Utc>) -> BlobResult<()> {
        let path = normalize(path)?;
        self.blobs.lock().insert(
            path,
            Entry {
                data: data.to_vec(),
                modified,
            },
        );
        Ok(())
    }

    /// Number of blobs stored.
    pub fn len(&self) -> usize {
        self.blobs.lock().len()
    }

    /// Returns true if no blobs are stored.
    pub fn is_empty(&self) -> bool {
        self.blobs.lock().is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn prepare(&self, dir: &str) -> BlobResult<()> {
        normalize(dir).map(|_| ())
    }

    fn put(&self, path: &str, data: &[u8]) -> BlobResult<()> {
        self.put_at(path, data, Utc::now())
    }

    fn get(&self, path: &str) -> BlobResult<Option<Vec<u8>>> {
        let path = normalize(path)?;
        Ok(self.blobs.lock().get(&path).map(|e| e.data.clone()))
    }

    fn exists(&self, path: &str) -> BlobResult<bool> {
        let path = normalize(path)?;
        Ok(self.blobs.lock().contains_key(&path))
    }

    fn delete(&self, path: &str) -> BlobResult<bool> {
        let path = normalize(path)?;
        Ok(self.blobs.lock().remove(&path).is_some())
    }

    fn clean(&self, dir: &str) -> BlobResult<()> {
        normalize(dir).map(|_| ())
    }

    fn list(&self, dir: &str) -> BlobResult<Vec<BlobInfo>> {
        let prefix = format!("{}/", normalize(dir)?);
        let blobs = self.blobs.lock();
        Ok(blobs
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, e)| BlobInfo {
                path: k.clone(),
                modified: e.modified,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_put_get_delete() {
        let store = MemoryBlobStore::new();
        store.put("/utterances/1/1234.opus", b"audio").unwrap();

        assert_eq!(
            store.get("utterances/1/1234.opus").unwrap(),
            Some(b"audio".to_vec())
        );
        assert!(store.exists("utterances/1/1234.opus").unwrap());

        assert!(store.delete("utterances/1/1234.opus").unwrap());
        assert!(!store.delete("utterances/1/1234.opus").unwrap());
        assert_eq!(store.get("utterances/1/1234.opus").unwrap(), None);
    }

    #[test]
    fn test_list_is_scoped_to_directory() {
        let store = MemoryBlobStore::new();
        let t = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        store.put_at("utterances/5.opus", b"a", t).unwrap();
        store.put_at("utterances/1/1234.json", b"m", t).unwrap();
        store.put_at("utterances_old/5.opus", b"x", t).unwrap();

        let listed = store.list("utterances").unwrap();
        let paths: Vec<&str> = listed.iter().map(|b| b.path.as_str()).collect();
        assert_eq!(paths, vec!["utterances/1/1234.json", "utterances/5.opus"]);
        assert_eq!(listed[0].modified, t);
    }
}
