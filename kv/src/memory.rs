//! In-memory key-value store.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{KVResult, KVStore, decode_counter};

/// An in-memory key-value store backed by an ordered map.
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns true if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }
}

impl KVStore for MemoryStore {
    fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>> {
        Ok(self.data.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> KVResult<()> {
        self.data.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> KVResult<()> {
        self.data.lock().remove(key);
        Ok(())
    }

    fn scan(&self, prefix: &str) -> KVResult<Vec<(String, Vec<u8>)>> {
        let data = self.data.lock();
        Ok(data
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn batch_set(&self, entries: &[(&str, &[u8])]) -> KVResult<()> {
        let mut data = self.data.lock();
        for (key, value) in entries {
            data.insert(key.to_string(), value.to_vec());
        }
        Ok(())
    }

    fn batch_delete(&self, keys: &[&str]) -> KVResult<()> {
        let mut data = self.data.lock();
        for key in keys {
            data.remove(*key);
        }
        Ok(())
    }

    fn increment(&self, key: &str) -> KVResult<u64> {
        let mut data = self.data.lock();
        let current = match data.get(key) {
            Some(raw) => decode_counter(raw)?,
            None => 0,
        };
        let next = current + 1;
        data.insert(key.to_string(), next.to_be_bytes().to_vec());
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let store = MemoryStore::new();

        store.set("utt:row:1", b"row").unwrap();
        assert_eq!(store.get("utt:row:1").unwrap(), Some(b"row".to_vec()));
        assert_eq!(store.get("utt:row:2").unwrap(), None);

        store.delete("utt:row:1").unwrap();
        assert_eq!(store.get("utt:row:1").unwrap(), None);

        // Deleting again is not an error.
        store.delete("utt:row:1").unwrap();
    }

    #[test]
    fn test_scan_is_sorted_and_scoped() {
        let store = MemoryStore::new();
        store.set("utt:row:2", b"2").unwrap();
        store.set("utt:row:1", b"1").unwrap();
        store.set("utt:rowx", b"x").unwrap();
        store.set("utt:key:a", b"").unwrap();

        let results = store.scan("utt:row:").unwrap();
        let keys: Vec<&str> = results.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["utt:row:1", "utt:row:2"]);
    }

    #[test]
    fn test_batch_operations() {
        let store = MemoryStore::new();

        store
            .batch_set(&[("row", b"value1"), ("index", b"")])
            .unwrap();
        assert_eq!(store.len(), 2);

        store.batch_delete(&["row", "index"]).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_increment_starts_at_one() {
        let store = MemoryStore::new();
        assert_eq!(store.increment("seq").unwrap(), 1);
        assert_eq!(store.increment("seq").unwrap(), 2);
        assert_eq!(store.increment("other").unwrap(), 1);
    }

    #[test]
    fn test_clones_share_data() {
        let store = MemoryStore::new();
        let shared = store.clone();
        store.set("k", b"v").unwrap();
        assert_eq!(shared.get("k").unwrap(), Some(b"v".to_vec()));
    }
}
