use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::errors::{RelKvError, Result};
use crate::model::{Cardinality, EntityDescriptor};
use crate::registry::EntityRegistry;
use crate::repository::Repository;
use relkv_store::KvStore;

/// Options for [`InstanceManager::init`]
#[derive(Debug, Clone, Default)]
pub struct InstanceOptions {
    /// Unique instance name; a random one is generated when absent
    pub name: Option<String>,

    /// Store keys as alternating `[fieldName, value]` pairs instead of
    /// bare values
    pub prefix_entity_keys: bool,
}

impl InstanceOptions {
    /// Options with an explicit instance name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            prefix_entity_keys: false,
        }
    }
}

/// State shared by an instance and every repository it hands out
pub(crate) struct InstanceShared {
    pub(crate) name: String,
    pub(crate) store: Arc<dyn KvStore>,
    pub(crate) entities: Vec<EntityDescriptor>,
    pub(crate) prefix_entity_keys: bool,
}

impl std::fmt::Debug for InstanceShared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceShared")
            .field("name", &self.name)
            .field("entities", &self.entities.len())
            .field("prefix_entity_keys", &self.prefix_entity_keys)
            .finish()
    }
}

/// A named binding between one store handle and a set of entity
/// descriptors
///
/// Cheap to clone; clones share the same store handle and entity set.
#[derive(Debug, Clone)]
pub struct Instance {
    shared: Arc<InstanceShared>,
}

impl Instance {
    /// The instance name
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// The entity descriptors this instance was bound with
    pub fn entities(&self) -> &[EntityDescriptor] {
        &self.shared.entities
    }

    /// Whether keys carry field-name prefixes
    pub fn prefix_entity_keys(&self) -> bool {
        self.shared.prefix_entity_keys
    }

    /// Repository for `entity`
    ///
    /// # Errors
    ///
    /// `EntityNotRegistered` when `entity` is outside the bound set.
    pub fn repository(&self, entity: &str) -> Result<Repository> {
        let descriptor = self
            .shared
            .entities
            .iter()
            .find(|e| e.name == entity)
            .cloned()
            .ok_or_else(|| RelKvError::EntityNotRegistered {
                entity: entity.to_string(),
            })?;
        Ok(Repository::new(Arc::clone(&self.shared), descriptor))
    }
}

/// Named registry of live store-bound instances
///
/// An explicit value rather than process-wide state: construct one per
/// application (or per test) and route `init`/`get`/`close` through it.
#[derive(Debug, Default)]
pub struct InstanceManager {
    instances: HashMap<String, Instance>,
}

impl InstanceManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `store` to the named entities and register the instance
    ///
    /// A random unique name is assigned when the options carry none.
    /// Every requested entity must be registered exactly once in
    /// `registry`; relation targets must themselves be part of the
    /// bound set, with foreign keys that can address the target's key
    /// (all of it for `One`, a leading subset for `Many`).
    ///
    /// # Errors
    ///
    /// `DuplicateInstanceName`, `EntityNotRegistered`,
    /// `AmbiguousEntityBinding`, `UnknownRelationTarget`, or
    /// `InvalidRelation`, all raised before any store I/O.
    pub fn init(
        &mut self,
        store: Arc<dyn KvStore>,
        registry: &EntityRegistry,
        entity_names: &[&str],
        options: InstanceOptions,
    ) -> Result<Instance> {
        let name = options
            .name
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if self.instances.contains_key(&name) {
            return Err(RelKvError::DuplicateInstanceName { name });
        }

        let mut entities = Vec::with_capacity(entity_names.len());
        for entity in entity_names {
            match registry.count(entity) {
                0 => {
                    return Err(RelKvError::EntityNotRegistered {
                        entity: (*entity).to_string(),
                    })
                }
                1 => {}
                _ => {
                    return Err(RelKvError::AmbiguousEntityBinding {
                        entity: (*entity).to_string(),
                    })
                }
            }
            if let Some(descriptor) = registry.find(entity) {
                entities.push(descriptor.clone());
            }
        }

        validate_relations(&entities)?;

        let instance = Instance {
            shared: Arc::new(InstanceShared {
                name: name.clone(),
                store,
                entities,
                prefix_entity_keys: options.prefix_entity_keys,
            }),
        };
        tracing::debug!(
            instance = %name,
            entities = instance.entities().len(),
            "instance registered"
        );
        self.instances.insert(name, instance.clone());
        Ok(instance)
    }

    /// Resolve a live instance by name
    pub fn get(&self, name: &str) -> Result<&Instance> {
        self.instances
            .get(name)
            .ok_or_else(|| RelKvError::InstanceNotFound {
                name: name.to_string(),
            })
    }

    /// Whether an instance is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.instances.contains_key(name)
    }

    /// Close the named instance
    ///
    /// Removes it from the manager and drops its store handle
    /// reference; subsequent `get` calls for the name fail.
    pub fn close(&mut self, name: &str) -> Result<()> {
        match self.instances.remove(name) {
            Some(_) => {
                tracing::debug!(instance = %name, "instance closed");
                Ok(())
            }
            None => Err(RelKvError::InstanceNotFound {
                name: name.to_string(),
            }),
        }
    }
}

/// Reject relation shapes that could never be traversed
fn validate_relations(entities: &[EntityDescriptor]) -> Result<()> {
    for descriptor in entities {
        for relation in &descriptor.relations {
            let target = entities
                .iter()
                .find(|e| e.name == relation.target_entity)
                .ok_or_else(|| RelKvError::UnknownRelationTarget {
                    entity: descriptor.name.clone(),
                    local_field: relation.local_field.clone(),
                    target: relation.target_entity.clone(),
                })?;

            if relation.foreign_key_fields.is_empty() {
                return Err(RelKvError::InvalidRelation {
                    entity: descriptor.name.clone(),
                    local_field: relation.local_field.clone(),
                    reason: "at least one foreign key field is required".to_string(),
                });
            }
            match relation.cardinality {
                Cardinality::One => {
                    if relation.foreign_key_fields.len() != target.key_fields.len() {
                        return Err(RelKvError::InvalidRelation {
                            entity: descriptor.name.clone(),
                            local_field: relation.local_field.clone(),
                            reason: format!(
                                "a ONE relation must cover the target's full key ({} fields, got {})",
                                target.key_fields.len(),
                                relation.foreign_key_fields.len()
                            ),
                        });
                    }
                }
                Cardinality::Many => {
                    if relation.foreign_key_fields.len() > target.key_fields.len() {
                        return Err(RelKvError::InvalidRelation {
                            entity: descriptor.name.clone(),
                            local_field: relation.local_field.clone(),
                            reason: format!(
                                "a MANY relation cannot use more foreign keys than the target's key fields ({} fields, got {})",
                                target.key_fields.len(),
                                relation.foreign_key_fields.len()
                            ),
                        });
                    }
                }
            }
        }
    }
    Ok(())
}
