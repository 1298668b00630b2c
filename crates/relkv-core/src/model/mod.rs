//! Domain model: entity and relation descriptors, record helpers

pub mod descriptor;
pub mod record;
pub mod relation;

pub use descriptor::EntityDescriptor;
pub use record::Record;
pub use relation::{Cardinality, DeleteStrategy, FetchStrategy, RelationDescriptor};
