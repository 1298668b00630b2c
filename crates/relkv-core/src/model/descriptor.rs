use serde::{Deserialize, Serialize};

use super::relation::RelationDescriptor;

/// Describes one entity type: its name, identifying key fields, and
/// outgoing relations
///
/// Descriptors are plain data built at startup and registered into an
/// [`EntityRegistry`](crate::EntityRegistry); nothing is discovered via
/// reflection or attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Entity name; first component of every store key for this entity
    pub name: String,

    /// Ordered fields whose values identify one record
    pub key_fields: Vec<String>,

    /// Outgoing relations
    pub relations: Vec<RelationDescriptor>,

    /// Field stamped with the creation time on first save
    pub auto_create_field: Option<String>,

    /// Field stamped with the current time on every overwriting save
    pub auto_update_field: Option<String>,
}

impl EntityDescriptor {
    /// Create a descriptor with the given name and key fields
    pub fn new(
        name: impl Into<String>,
        key_fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            key_fields: key_fields.into_iter().map(Into::into).collect(),
            relations: Vec::new(),
            auto_create_field: None,
            auto_update_field: None,
        }
    }

    /// Add an outgoing relation
    pub fn with_relation(mut self, relation: RelationDescriptor) -> Self {
        self.relations.push(relation);
        self
    }

    /// Stamp `field` with the creation time on first save
    pub fn with_auto_create_field(mut self, field: impl Into<String>) -> Self {
        self.auto_create_field = Some(field.into());
        self
    }

    /// Stamp `field` with the current time on overwriting saves
    pub fn with_auto_update_field(mut self, field: impl Into<String>) -> Self {
        self.auto_update_field = Some(field.into());
        self
    }

    /// Whether any relations are declared
    pub fn has_relations(&self) -> bool {
        !self.relations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::relation::Cardinality;

    #[test]
    fn test_builder() {
        let descriptor = EntityDescriptor::new("user", ["id"])
            .with_relation(RelationDescriptor::new(
                "book",
                Cardinality::Many,
                "books",
                ["id"],
            ))
            .with_auto_create_field("created_at")
            .with_auto_update_field("updated_at");

        assert_eq!(descriptor.name, "user");
        assert_eq!(descriptor.key_fields, vec!["id"]);
        assert!(descriptor.has_relations());
        assert_eq!(descriptor.auto_create_field.as_deref(), Some("created_at"));
        assert_eq!(descriptor.auto_update_field.as_deref(), Some("updated_at"));
    }
}
