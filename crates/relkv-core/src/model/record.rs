use serde_json::{Map, Value};

use super::descriptor::EntityDescriptor;

/// An entity instance's fields
///
/// Records are schemaless JSON object maps; the descriptor only pins
/// down the key fields and relations. Relation fields exist in memory
/// after hydration but are never persisted.
pub type Record = Map<String, Value>;

/// Whether `field` counts as missing on `record`
///
/// Absent, `null`, and empty-string values are all missing; `0` and
/// `false` are valid key values.
pub fn is_missing(record: &Record, field: &str) -> bool {
    match record.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// The subset of `fields` missing on `record`, in declaration order
pub fn missing_fields(record: &Record, fields: &[String]) -> Vec<String> {
    fields
        .iter()
        .filter(|f| is_missing(record, f))
        .cloned()
        .collect()
}

/// Whether every field in `fields` is present on `record`
pub fn has_fields(record: &Record, fields: &[String]) -> bool {
    fields.iter().all(|f| !is_missing(record, f))
}

/// Remove every relation field declared by `descriptor` from `record`
pub fn strip_relation_fields(record: &mut Record, descriptor: &EntityDescriptor) {
    for relation in &descriptor.relations {
        record.remove(&relation.local_field);
    }
}
