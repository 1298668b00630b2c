//! RelKV Core - entity and relation persistence over ordered key-value storage
//!
//! This crate provides the persistence layer itself:
//! - Entity and relation descriptors as plain data, registered explicitly
//! - Composite-key derivation (plain and field-name-prefixed layouts)
//! - Depth-bounded eager/lazy relation materialization
//! - Cascading deletes staged into one atomic store transaction
//! - Repositories bound to a named store instance
//!
//! The store itself is external: anything implementing
//! [`relkv_store::KvStore`] works, including the bundled in-memory
//! backend.

pub mod errors;
pub mod instance;
pub mod keys;
pub mod logging;
pub mod model;
pub mod registry;
pub mod relations;
pub mod repository;

// Re-export commonly used types
pub use errors::{ErrorKind, RelKvError, Result};
pub use instance::{Instance, InstanceManager, InstanceOptions};
pub use model::{
    Cardinality, DeleteStrategy, EntityDescriptor, FetchStrategy, Record, RelationDescriptor,
};
pub use registry::EntityRegistry;
pub use relations::{LazyRelation, RelationLoadChain};
pub use repository::{FindOptions, Hydrated, Repository};
