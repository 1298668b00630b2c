//! RelKV Store - ordered key-value storage contract
//!
//! This crate defines the minimal store contract the RelKV persistence
//! layer is built against:
//! - Composite `Key` type with a total order suitable for prefix scans
//! - `KvStore` trait: point get, ordered prefix list, atomic batch commit
//! - `Batch` transaction builder staging sets and deletes
//! - `MemoryStore` reference backend for tests and embedding

pub mod batch;
pub mod errors;
pub mod key;
pub mod memory;
pub mod store;

// Re-export key types
pub use batch::{Batch, Mutation};
pub use errors::{Result, StoreError};
pub use key::{Key, KeyPart};
pub use memory::MemoryStore;
pub use store::{Entry, KvStore};
