use crate::model::EntityDescriptor;

/// Append-only table of entity descriptors
///
/// Registration performs no dedup and no validation; the same name may
/// be registered any number of times. Ambiguity is only an error when an
/// instance tries to *bind* such a name (see
/// [`InstanceManager::init`](crate::InstanceManager::init)). The
/// registry is an explicit value the caller constructs and passes
/// around, so isolated test runs need no global teardown.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: Vec<EntityDescriptor>,
}

impl EntityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor
    pub fn register(&mut self, descriptor: EntityDescriptor) {
        self.entities.push(descriptor);
    }

    /// First descriptor registered under `name`, if any
    pub fn find(&self, name: &str) -> Option<&EntityDescriptor> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// How many descriptors are registered under `name`
    pub fn count(&self, name: &str) -> usize {
        self.entities.iter().filter(|e| e.name == name).count()
    }

    /// All registered descriptors, in registration order
    pub fn iter(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.entities.iter()
    }

    /// Number of registrations (duplicates included)
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
