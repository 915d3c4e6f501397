//! Redb-based persistent key-value store implementation.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use crate::{KVError, KVResult, KVStore, decode_counter};

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

fn storage<E: ToString>(e: E) -> KVError {
    KVError::Storage(e.to_string())
}

/// A persistent key-value store backed by redb.
///
/// Every write runs in its own write transaction, so batch operations and
/// [`KVStore::increment`] are atomic with respect to concurrent callers.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create a redb store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> KVResult<Self> {
        let db = Database::create(path).map_err(storage)?;

        // Create the table if it doesn't exist
        let tx = db.begin_write().map_err(storage)?;
        {
            let _ = tx.open_table(TABLE).map_err(storage)?;
        }
        tx.commit().map_err(storage)?;

        Ok(Self { db })
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> KVResult<Option<Vec<u8>>> {
        let tx = self.db.begin_read().map_err(storage)?;
        let table = tx.open_table(TABLE).map_err(storage)?;

        match table.get(key).map_err(storage)? {
            Some(value) => Ok(Some(value.value().to_vec())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> KVResult<()> {
        self.batch_set(&[(key, value)])
    }

    fn delete(&self, key: &str) -> KVResult<()> {
        self.batch_delete(&[key])
    }

    fn scan(&self, prefix: &str) -> KVResult<Vec<(String, Vec<u8>)>> {
        let tx = self.db.begin_read().map_err(storage)?;
        let table = tx.open_table(TABLE).map_err(storage)?;

        let mut results = Vec::new();
        for item in table.iter().map_err(storage)? {
            let (key, value) = item.map_err(storage)?;
            let key_str = key.value();
            if key_str.starts_with(prefix) {
                results.push((key_str.to_string(), value.value().to_vec()));
            }
        }

        results.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(results)
    }

    fn batch_set(&self, entries: &[(&str, &[u8])]) -> KVResult<()> {
        let tx = self.db.begin_write().map_err(storage)?;
        {
            let mut table = tx.open_table(TABLE).map_err(storage)?;
            for (key, value) in entries {
                table.insert(*key, *value).map_err(storage)?;
            }
        }
        tx.commit().map_err(storage)?;
        Ok(())
    }

    fn batch_delete(&self, keys: &[&str]) -> KVResult<()> {
        let tx = self.db.begin_write().map_err(storage)?;
        {
            let mut table = tx.open_table(TABLE).map_err(storage)?;
            for key in keys {
                table.remove(*key).map_err(storage)?;
            }
        }
        tx.commit().map_err(storage)?;
        Ok(())
    }

    fn increment(&self, key: &str) -> KVResult<u64> {
        let tx = self.db.begin_write().map_err(storage)?;
        let next = {
            let mut table = tx.open_table(TABLE).map_err(storage)?;
            let current = match table.get(key).map_err(storage)? {
                Some(value) => decode_counter(value.value())?,
                None => 0,
            };
            let next = current + 1;
            let encoded = next.to_be_bytes();
            table.insert(key, encoded.as_slice()).map_err(storage)?;
            next
        };
        tx.commit().map_err(storage)?;
        Ok(next)
    }
}
