use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::errors::{RelKvError, Result};
use crate::instance::InstanceShared;
use crate::keys;
use crate::model::{
    record, Cardinality, DeleteStrategy, EntityDescriptor, FetchStrategy, Record,
    RelationDescriptor,
};
use crate::relations::chain::RelationLoadChain;
use crate::relations::lazy::LazyRelation;
use crate::repository::FindOptions;
use relkv_store::Batch;

/// Loads and cascades relations for one instance
///
/// Traversal is sequential (one relation, one recursive call at a time)
/// so the shared depth register stays well-defined. Store failures
/// propagate out unchanged, aborting the enclosing operation before
/// anything commits.
pub(crate) struct RelationEngine<'a> {
    shared: &'a Arc<InstanceShared>,
}

impl<'a> RelationEngine<'a> {
    pub(crate) fn new(shared: &'a Arc<InstanceShared>) -> Self {
        Self { shared }
    }

    fn descriptor(&self, entity: &str) -> Result<&'a EntityDescriptor> {
        self.shared
            .entities
            .iter()
            .find(|e| e.name == entity)
            .ok_or_else(|| RelKvError::EntityNotRegistered {
                entity: entity.to_string(),
            })
    }

    /// Hydrate every relation of `record` per `options`
    ///
    /// Eager relations are materialized in place; lazy relations whose
    /// foreign keys are present come back as deferred handles.
    pub(crate) fn load_all(
        &self,
        record: &mut Record,
        descriptor: &EntityDescriptor,
        options: FindOptions,
    ) -> Result<BTreeMap<String, LazyRelation>> {
        let mut chain = RelationLoadChain::new(options.relation_depth);
        let mut lazy = BTreeMap::new();
        self.load_relations(record, descriptor, &mut chain, Some(&mut lazy))?;
        Ok(lazy)
    }

    /// Resolve each relation of `descriptor` on `record`
    ///
    /// An eager relation whose foreign keys are not all present is
    /// skipped: not applicable yet, by contract not an error. Lazy
    /// relations only surface at the top level, where `lazy_sink` is
    /// provided; nested records keep them unresolved.
    fn load_relations(
        &self,
        target_record: &mut Record,
        descriptor: &EntityDescriptor,
        chain: &mut RelationLoadChain,
        mut lazy_sink: Option<&mut BTreeMap<String, LazyRelation>>,
    ) -> Result<()> {
        for relation in &descriptor.relations {
            let applicable = record::has_fields(target_record, &relation.foreign_key_fields);
            match relation.fetch_strategy {
                FetchStrategy::Lazy => {
                    if let Some(sink) = lazy_sink.as_deref_mut() {
                        if applicable {
                            sink.insert(
                                relation.local_field.clone(),
                                LazyRelation::new(
                                    Arc::clone(self.shared),
                                    relation.clone(),
                                    target_record.clone(),
                                    chain.max_depth(),
                                ),
                            );
                        }
                    }
                }
                FetchStrategy::Eager => {
                    if applicable {
                        let value = self.load_relation_value(target_record, relation, chain)?;
                        target_record.insert(relation.local_field.clone(), value);
                    } else {
                        tracing::debug!(
                            entity = %descriptor.name,
                            relation = %relation.local_field,
                            "skipping relation, foreign keys not populated"
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Load one relation's value for `owner`
    ///
    /// `One` resolves via point lookup (missing target becomes `null`);
    /// `Many` collects every record under the derived prefix, in key
    /// order. If the chain allows it, each result's own relations are
    /// loaded with the same chain before the register is reset for the
    /// next sibling.
    pub(crate) fn load_relation_value(
        &self,
        owner: &Record,
        relation: &RelationDescriptor,
        chain: &mut RelationLoadChain,
    ) -> Result<Value> {
        let target = self.descriptor(&relation.target_entity)?;
        let key = keys::relation_key(owner, relation, target, self.shared.prefix_entity_keys)?;

        let mut value = match relation.cardinality {
            Cardinality::Many => {
                let entries = self.shared.store.list(&key)?;
                Value::Array(entries.into_iter().map(|e| e.value).collect())
            }
            Cardinality::One => self.shared.store.get(&key)?.unwrap_or(Value::Null),
        };

        chain.descend();
        if !chain.limit_reached() {
            match &mut value {
                Value::Array(items) => {
                    for item in items.iter_mut() {
                        if let Value::Object(child) = item {
                            self.load_relations(child, target, chain, None)?;
                        }
                    }
                }
                Value::Object(child) => {
                    self.load_relations(child, target, chain, None)?;
                }
                _ => {}
            }
        }
        chain.finish_subtree();

        Ok(value)
    }

    /// Cascade `record`'s deletable relation subtrees into `batch`
    ///
    /// Acts on every relation whose foreign keys are fully present on
    /// the record; each delete is staged, never committed here.
    pub(crate) fn delete_relations(
        &self,
        target_record: &Record,
        descriptor: &EntityDescriptor,
        batch: &mut Batch,
    ) -> Result<()> {
        for relation in &descriptor.relations {
            if record::has_fields(target_record, &relation.foreign_key_fields) {
                self.delete_relation(target_record, relation, batch)?;
            }
        }
        Ok(())
    }

    /// Stage the cascade delete of one relation's subtree
    ///
    /// No-op unless the relation cascades. `Many` scans the derived
    /// prefix, staging each child's delete and cascading the child's own
    /// relations; `One` fetches the single target and does the same.
    /// Keys already staged for deletion are not revisited, so mutually
    /// referencing records terminate.
    pub(crate) fn delete_relation(
        &self,
        owner: &Record,
        relation: &RelationDescriptor,
        batch: &mut Batch,
    ) -> Result<()> {
        if relation.delete_strategy != DeleteStrategy::Cascade {
            return Ok(());
        }
        let target = self.descriptor(&relation.target_entity)?;
        let key = keys::relation_key(owner, relation, target, self.shared.prefix_entity_keys)?;

        match relation.cardinality {
            Cardinality::Many => {
                for entry in self.shared.store.list(&key)? {
                    if batch.stages_delete(&entry.key) {
                        continue;
                    }
                    batch.delete(entry.key);
                    if let Value::Object(child) = &entry.value {
                        self.delete_relations(child, target, batch)?;
                    }
                }
            }
            Cardinality::One => {
                if batch.stages_delete(&key) {
                    return Ok(());
                }
                let existing = self.shared.store.get(&key)?;
                batch.delete(key);
                if let Some(Value::Object(child)) = existing {
                    self.delete_relations(&child, target, batch)?;
                }
            }
        }
        tracing::debug!(
            entity = %relation.target_entity,
            relation = %relation.local_field,
            staged = batch.len(),
            "cascade staged"
        );
        Ok(())
    }
}
