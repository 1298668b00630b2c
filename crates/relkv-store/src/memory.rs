//! In-memory storage backend.

use crate::batch::{Batch, Mutation};
use crate::errors::Result;
use crate::key::Key;
use crate::store::{Entry, KvStore};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;

/// In-memory store backend.
///
/// All data lives in a single ordered map and is lost when the store is
/// dropped. Useful for unit tests, examples, and embedding without an
/// external store. Commits hold the write lock for the whole batch, so
/// readers never observe a half-applied transaction.
pub struct MemoryStore {
    entries: RwLock<BTreeMap<Key, Value>>,
}

impl MemoryStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop all records (for testing)
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn list(&self, prefix: &Key) -> Result<Vec<Entry>> {
        let entries = self.entries.read();
        // Extensions of a prefix form a contiguous run starting at the
        // prefix itself, so a range scan plus take_while is exact.
        Ok(entries
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| Entry {
                key: key.clone(),
                value: value.clone(),
            })
            .collect())
    }

    fn commit(&self, batch: Batch) -> Result<()> {
        let mut entries = self.entries.write();
        tracing::debug!(staged = batch.len(), "applying batch");
        for mutation in batch.into_mutations() {
            match mutation {
                Mutation::Set { key, value } => {
                    entries.insert(key, value);
                }
                Mutation::Delete { key } => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(parts: &[&str]) -> Key {
        Key::from_parts(parts.iter().map(|p| (*p).into()).collect())
    }

    #[test]
    fn test_commit_and_get() {
        let store = MemoryStore::new();
        let mut batch = Batch::new();
        batch.set(key(&["user", "1"]), json!({"id": "1"}));
        store.commit(batch).unwrap();

        let found = store.get(&key(&["user", "1"])).unwrap();
        assert_eq!(found, Some(json!({"id": "1"})));
        assert_eq!(store.get(&key(&["user", "2"])).unwrap(), None);
    }

    #[test]
    fn test_list_is_key_ordered_and_prefix_bounded() {
        let store = MemoryStore::new();
        let mut batch = Batch::new();
        batch.set(key(&["user", "2"]), json!({"id": "2"}));
        batch.set(key(&["user", "1"]), json!({"id": "1"}));
        batch.set(key(&["usurper", "1"]), json!({"id": "x"}));
        batch.set(key(&["book", "1"]), json!({"id": "b"}));
        store.commit(batch).unwrap();

        let listed = store.list(&key(&["user"])).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].key, key(&["user", "1"]));
        assert_eq!(listed[1].key, key(&["user", "2"]));
    }

    #[test]
    fn test_commit_applies_deletes() {
        let store = MemoryStore::new();
        let mut batch = Batch::new();
        batch.set(key(&["user", "1"]), json!({"id": "1"}));
        batch.set(key(&["user", "2"]), json!({"id": "2"}));
        store.commit(batch).unwrap();

        let mut batch = Batch::new();
        batch.delete(key(&["user", "1"]));
        batch.set(key(&["user", "3"]), json!({"id": "3"}));
        store.commit(batch).unwrap();

        assert_eq!(store.get(&key(&["user", "1"])).unwrap(), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_set_then_delete_in_one_batch() {
        let store = MemoryStore::new();
        let mut batch = Batch::new();
        batch.set(key(&["user", "1"]), json!({"id": "1"}));
        batch.delete(key(&["user", "1"]));
        store.commit(batch).unwrap();

        // Mutations apply in staging order
        assert_eq!(store.get(&key(&["user", "1"])).unwrap(), None);
    }
}
