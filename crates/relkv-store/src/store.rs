use crate::batch::Batch;
use crate::errors::Result;
use crate::key::Key;
use serde_json::Value;

/// One listed record: the full key and the stored value
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: Key,
    pub value: Value,
}

/// Ordered key-value store contract
///
/// The persistence layer is written against this trait only; backends
/// are interchangeable. Implementations must keep `list` output in key
/// order and apply a committed [`Batch`] atomically: every staged
/// mutation or none.
pub trait KvStore: Send + Sync {
    /// Point lookup
    fn get(&self, key: &Key) -> Result<Option<Value>>;

    /// All entries whose key starts with `prefix`, in key order
    fn list(&self, prefix: &Key) -> Result<Vec<Entry>>;

    /// Apply every mutation staged in `batch`, or none of them
    fn commit(&self, batch: Batch) -> Result<()>;
}
