use serde::{Deserialize, Serialize};

/// Whether a relation resolves to a single record or a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    /// Point lookup of exactly one target record
    One,
    /// Prefix scan collecting every matching target record
    Many,
}

/// What happens to related records when the owner is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeleteStrategy {
    /// Delete the related subtree in the same transaction
    Cascade,
    /// Leave related records untouched
    #[default]
    NoAction,
}

/// When a relation is resolved during a load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FetchStrategy {
    /// Resolve immediately while hydrating the owner
    #[default]
    Eager,
    /// Defer resolution behind an explicit handle
    Lazy,
}

/// A directed reference from one entity to another
///
/// `foreign_key_fields` name the fields on the *owning* entity whose
/// values, in order, address the target: they must line up positionally
/// with the target's key fields: all of them for `One`, a leading
/// subset for `Many` (the remainder is the scanned range).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    /// Name of the target entity
    pub target_entity: String,

    /// Single record or collection
    pub cardinality: Cardinality,

    /// Behavior on owner deletion
    pub delete_strategy: DeleteStrategy,

    /// Immediate or deferred resolution
    pub fetch_strategy: FetchStrategy,

    /// Field on the owner that receives the loaded value; never persisted
    pub local_field: String,

    /// Owner fields whose values address the target, in key order
    pub foreign_key_fields: Vec<String>,
}

impl RelationDescriptor {
    /// Create a relation with default strategies (no action, eager)
    pub fn new(
        target_entity: impl Into<String>,
        cardinality: Cardinality,
        local_field: impl Into<String>,
        foreign_key_fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            target_entity: target_entity.into(),
            cardinality,
            delete_strategy: DeleteStrategy::default(),
            fetch_strategy: FetchStrategy::default(),
            local_field: local_field.into(),
            foreign_key_fields: foreign_key_fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Cascade-delete the target subtree when the owner is deleted
    pub fn cascade(mut self) -> Self {
        self.delete_strategy = DeleteStrategy::Cascade;
        self
    }

    /// Defer resolution behind a [`LazyRelation`](crate::LazyRelation) handle
    pub fn lazy(mut self) -> Self {
        self.fetch_strategy = FetchStrategy::Lazy;
        self
    }
}
