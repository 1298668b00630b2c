use crate::key::Key;
use serde_json::Value;

/// One staged store mutation
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Set { key: Key, value: Value },
    Delete { key: Key },
}

/// Atomic transaction builder
///
/// Mutations staged here do not touch the store until the whole batch is
/// handed to [`KvStore::commit`](crate::store::KvStore::commit), which
/// applies them together or not at all.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    mutations: Vec<Mutation>,
}

impl Batch {
    /// Create an empty batch
    pub fn new() -> Self {
        Batch {
            mutations: Vec::new(),
        }
    }

    /// Stage a write of `value` at `key`
    pub fn set(&mut self, key: Key, value: Value) {
        self.mutations.push(Mutation::Set { key, value });
    }

    /// Stage a deletion of `key`
    pub fn delete(&mut self, key: Key) {
        self.mutations.push(Mutation::Delete { key });
    }

    /// The staged mutations, in staging order
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Consume the batch, yielding the staged mutations
    pub fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }

    /// Whether a deletion of `key` is already staged
    pub fn stages_delete(&self, key: &Key) -> bool {
        self.mutations
            .iter()
            .any(|m| matches!(m, Mutation::Delete { key: staged } if staged == key))
    }

    /// Number of staged mutations
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Whether nothing is staged
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}
