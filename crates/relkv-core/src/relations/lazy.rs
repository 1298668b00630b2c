use std::sync::Arc;

use serde_json::Value;

use crate::errors::Result;
use crate::instance::InstanceShared;
use crate::model::{Record, RelationDescriptor};
use crate::relations::chain::RelationLoadChain;
use crate::relations::engine::RelationEngine;

/// Deferred accessor for a lazily fetched relation
///
/// Handed out by `find_all`/`find_by_ids` for every lazy relation whose
/// foreign keys were present at hydration time. Nothing is read until
/// [`load`](Self::load) is called; the first successful load is cached,
/// and [`reload`](Self::reload) forces a fresh fetch.
pub struct LazyRelation {
    shared: Arc<InstanceShared>,
    relation: RelationDescriptor,
    owner: Record,
    max_depth: u32,
    loaded: Option<Value>,
}

impl LazyRelation {
    pub(crate) fn new(
        shared: Arc<InstanceShared>,
        relation: RelationDescriptor,
        owner: Record,
        max_depth: u32,
    ) -> Self {
        Self {
            shared,
            relation,
            owner,
            max_depth,
            loaded: None,
        }
    }

    /// The owner field this relation resolves into
    pub fn field(&self) -> &str {
        &self.relation.local_field
    }

    /// The relation being deferred
    pub fn relation(&self) -> &RelationDescriptor {
        &self.relation
    }

    /// Whether a resolved value is cached
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Resolve the relation, fetching from the store on first call
    ///
    /// Subsequent calls return the cached value without touching the
    /// store; use [`reload`](Self::reload) to observe later writes.
    pub fn load(&mut self) -> Result<&Value> {
        if self.loaded.is_none() {
            let value = self.fetch()?;
            self.loaded = Some(value);
        }
        match &self.loaded {
            Some(value) => Ok(value),
            None => Err(crate::errors::RelKvError::Internal {
                message: "lazy relation lost its freshly cached value".to_string(),
            }),
        }
    }

    /// Discard any cached value and fetch again
    pub fn reload(&mut self) -> Result<&Value> {
        let value = self.fetch()?;
        Ok(self.loaded.insert(value))
    }

    fn fetch(&self) -> Result<Value> {
        let engine = RelationEngine::new(&self.shared);
        let mut chain = RelationLoadChain::new(self.max_depth);
        engine.load_relation_value(&self.owner, &self.relation, &mut chain)
    }
}

impl std::fmt::Debug for LazyRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyRelation")
            .field("field", &self.relation.local_field)
            .field("target_entity", &self.relation.target_entity)
            .field("max_depth", &self.max_depth)
            .field("is_loaded", &self.is_loaded())
            .finish()
    }
}
