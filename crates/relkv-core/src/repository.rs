use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::errors::{RelKvError, Result};
use crate::instance::InstanceShared;
use crate::keys;
use crate::model::{record, EntityDescriptor, Record};
use crate::relations::{LazyRelation, RelationEngine};
use relkv_store::{Batch, Key, KeyPart};

/// Options for `find_all` / `find_by_ids`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindOptions {
    /// How many relation levels to auto-resolve; bounds each branch of
    /// the traversal, not the whole call
    pub relation_depth: u32,
}

impl FindOptions {
    /// Resolve `relation_depth` relation levels
    pub fn with_depth(relation_depth: u32) -> Self {
        Self { relation_depth }
    }
}

impl Default for FindOptions {
    /// One relation level
    fn default() -> Self {
        Self { relation_depth: 1 }
    }
}

/// A record returned by a find, together with its deferred relations
///
/// Eager relations are already materialized inside the record; each lazy
/// relation whose foreign keys were present is represented by a
/// [`LazyRelation`] handle keyed by its local field.
#[derive(Debug)]
pub struct Hydrated {
    record: Record,
    lazy: BTreeMap<String, LazyRelation>,
}

impl Hydrated {
    /// The hydrated record
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Consume, yielding the record and dropping unused handles
    pub fn into_record(self) -> Record {
        self.record
    }

    /// Deferred handle for the lazy relation at `field`
    pub fn lazy(&mut self, field: &str) -> Option<&mut LazyRelation> {
        self.lazy.get_mut(field)
    }

    /// Fields with deferred handles, in field order
    pub fn lazy_fields(&self) -> impl Iterator<Item = &str> {
        self.lazy.keys().map(String::as_str)
    }

    /// Consume, yielding the record and all deferred handles
    pub fn into_parts(self) -> (Record, BTreeMap<String, LazyRelation>) {
        (self.record, self.lazy)
    }
}

/// Per-entity persistence operations, bound to one instance
///
/// Every multi-record mutation stages into one atomic batch committed
/// exactly once per call: all staged writes and deletes apply together
/// or not at all. The reads used to discover cascade targets and
/// previous values run before that commit and are not conflict-checked;
/// a concurrent writer may alter them in between. This layer accepts
/// that as documented best-effort consistency.
#[derive(Debug)]
pub struct Repository {
    shared: Arc<InstanceShared>,
    descriptor: EntityDescriptor,
}

impl Repository {
    pub(crate) fn new(shared: Arc<InstanceShared>, descriptor: EntityDescriptor) -> Self {
        Self { shared, descriptor }
    }

    /// The entity this repository serves
    pub fn entity_name(&self) -> &str {
        &self.descriptor.name
    }

    /// Persist one record; returns its derived key
    ///
    /// # Errors
    ///
    /// `SaveMissingKeys` when key fields are absent; store failures
    /// propagate unchanged.
    pub fn save(&self, record: Record) -> Result<Key> {
        let mut derived = self.save_many(vec![record])?;
        match derived.pop() {
            Some(key) => Ok(key),
            None => Err(RelKvError::Internal {
                message: "save staged one record but derived no key".to_string(),
            }),
        }
    }

    /// Persist several records in one atomic transaction
    ///
    /// For each record: validates key fields, strips relation fields,
    /// cascades subtrees orphaned by cleared foreign keys, applies the
    /// auto-create/auto-update timestamps, and stages the write. Returns
    /// the derived keys in input order.
    ///
    /// # Errors
    ///
    /// `SaveMissingKeys` on the first invalid record; nothing commits.
    pub fn save_many(&self, records: Vec<Record>) -> Result<Vec<Key>> {
        let engine = RelationEngine::new(&self.shared);
        let mut batch = Batch::new();
        let mut saved_keys = Vec::with_capacity(records.len());

        for mut entry in records {
            let missing = keys::missing_key_fields(&entry, &self.descriptor);
            if !missing.is_empty() {
                return Err(RelKvError::SaveMissingKeys { fields: missing });
            }

            record::strip_relation_fields(&mut entry, &self.descriptor);

            let key = keys::entity_key(&entry, &self.descriptor, self.shared.prefix_entity_keys)
                .map_err(keys::KeyError::into_save_error)?;
            let existing = self.shared.store.get(&key)?;

            if let Some(Value::Object(previous)) = &existing {
                // Orphan cleanup: a relation whose foreign keys were
                // present on the stored value but are now cleared loses
                // its subtree, derived from the old value.
                for relation in &self.descriptor.relations {
                    let was_present = record::has_fields(previous, &relation.foreign_key_fields);
                    let now_cleared = relation
                        .foreign_key_fields
                        .iter()
                        .any(|f| record::is_missing(&entry, f));
                    if was_present && now_cleared {
                        engine.delete_relation(previous, relation, &mut batch)?;
                    }
                }
            }

            if let Some(field) = &self.descriptor.auto_update_field {
                if existing.is_some() {
                    entry.insert(field.clone(), now_timestamp());
                }
            }
            if let Some(field) = &self.descriptor.auto_create_field {
                let stamp = existing
                    .as_ref()
                    .and_then(|previous| previous.get(field))
                    .filter(|stored| !stored.is_null())
                    .cloned()
                    .unwrap_or_else(now_timestamp);
                entry.insert(field.clone(), stamp);
            }

            batch.set(key.clone(), Value::Object(entry));
            saved_keys.push(key);
        }

        tracing::debug!(
            entity = %self.descriptor.name,
            records = saved_keys.len(),
            staged = batch.len(),
            "committing save"
        );
        self.shared.store.commit(batch)?;
        Ok(saved_keys)
    }

    /// Delete one record and cascade its relation subtrees
    ///
    /// # Errors
    ///
    /// `DeleteMissingKeys` when key fields are absent;
    /// `DeleteTargetNotFound` when no record exists at the derived key.
    pub fn delete(&self, target: &Record) -> Result<()> {
        self.delete_many(std::slice::from_ref(target))
    }

    /// Delete several records in one atomic transaction
    ///
    /// Each record's relation subtrees cascade into the same batch; one
    /// failed validation or lookup aborts the whole call with nothing
    /// staged against the store.
    pub fn delete_many(&self, targets: &[Record]) -> Result<()> {
        let engine = RelationEngine::new(&self.shared);
        let mut batch = Batch::new();

        for target in targets {
            let missing = keys::missing_key_fields(target, &self.descriptor);
            if !missing.is_empty() {
                return Err(RelKvError::DeleteMissingKeys { fields: missing });
            }

            let key = keys::entity_key(target, &self.descriptor, self.shared.prefix_entity_keys)
                .map_err(keys::KeyError::into_delete_error)?;
            let existing = self
                .shared
                .store
                .get(&key)?
                .ok_or_else(|| RelKvError::DeleteTargetNotFound { key: key.clone() })?;

            batch.delete(key);
            if let Value::Object(found) = existing {
                engine.delete_relations(&found, &self.descriptor, &mut batch)?;
            }
        }

        tracing::debug!(
            entity = %self.descriptor.name,
            records = targets.len(),
            staged = batch.len(),
            "committing delete"
        );
        self.shared.store.commit(batch)?;
        Ok(())
    }

    /// All records of this entity, hydrated per `options`, in key order
    pub fn find_all(&self, options: FindOptions) -> Result<Vec<Hydrated>> {
        let engine = RelationEngine::new(&self.shared);
        let prefix = Key::from_parts(vec![KeyPart::from(self.descriptor.name.as_str())]);

        let mut results = Vec::new();
        for entry in self.shared.store.list(&prefix)? {
            if let Value::Object(mut found) = entry.value {
                let lazy = engine.load_all(&mut found, &self.descriptor, options)?;
                results.push(Hydrated {
                    record: found,
                    lazy,
                });
            }
        }
        Ok(results)
    }

    /// Look up one record by its key fields, hydrated per `options`
    ///
    /// Returns `None` when no record exists at the derived key.
    ///
    /// # Errors
    ///
    /// `FindMissingKeys` when key fields are absent on the request.
    pub fn find_by_ids(&self, target: &Record, options: FindOptions) -> Result<Option<Hydrated>> {
        let missing = keys::missing_key_fields(target, &self.descriptor);
        if !missing.is_empty() {
            return Err(RelKvError::FindMissingKeys { fields: missing });
        }

        let key = keys::entity_key(target, &self.descriptor, self.shared.prefix_entity_keys)
            .map_err(keys::KeyError::into_find_error)?;

        match self.shared.store.get(&key)? {
            Some(Value::Object(mut found)) => {
                let engine = RelationEngine::new(&self.shared);
                let lazy = engine.load_all(&mut found, &self.descriptor, options)?;
                Ok(Some(Hydrated {
                    record: found,
                    lazy,
                }))
            }
            _ => Ok(None),
        }
    }
}

fn now_timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339())
}
