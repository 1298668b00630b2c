//! Composite-key derivation
//!
//! The store key for an entity is `[entityName, <components>]` where the
//! components are either the ordered key-field values, or alternating
//! `[fieldName, value]` pairs when the instance prefixes keys with field
//! names. Relation keys reuse the same layout, reading the owner's
//! foreign-key fields in place of the target's own key fields.

use crate::errors::RelKvError;
use crate::model::{record, EntityDescriptor, Record, RelationDescriptor};
use relkv_store::{Key, KeyPart};
use serde_json::Value;
use thiserror::Error;

/// Key derivation failure; callers translate into the operation-specific
/// error kind
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KeyError {
    /// One or more addressed fields are absent, null, or empty
    #[error("object is missing key values [{}]", fields.join(","))]
    Missing { fields: Vec<String> },

    /// A field holds a value no key component can represent
    #[error("field '{field}' holds a value that cannot be used as a key component")]
    Unsupported { field: String },
}

impl KeyError {
    pub(crate) fn into_save_error(self) -> RelKvError {
        match self {
            KeyError::Missing { fields } => RelKvError::SaveMissingKeys { fields },
            KeyError::Unsupported { field } => RelKvError::UnsupportedKeyValue { field },
        }
    }

    pub(crate) fn into_find_error(self) -> RelKvError {
        match self {
            KeyError::Missing { fields } => RelKvError::FindMissingKeys { fields },
            KeyError::Unsupported { field } => RelKvError::UnsupportedKeyValue { field },
        }
    }

    pub(crate) fn into_delete_error(self) -> RelKvError {
        match self {
            KeyError::Missing { fields } => RelKvError::DeleteMissingKeys { fields },
            KeyError::Unsupported { field } => RelKvError::UnsupportedKeyValue { field },
        }
    }
}

impl From<KeyError> for RelKvError {
    /// Fallback mapping for engine-internal derivation, where presence
    /// was already checked and `Missing` cannot legitimately occur
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::Missing { fields } => RelKvError::Internal {
                message: format!(
                    "key derivation on a presence-checked record reported missing fields [{}]",
                    fields.join(",")
                ),
            },
            KeyError::Unsupported { field } => RelKvError::UnsupportedKeyValue { field },
        }
    }
}

/// The key fields of `descriptor` missing on `record`
pub fn missing_key_fields(record: &Record, descriptor: &EntityDescriptor) -> Vec<String> {
    record::missing_fields(record, &descriptor.key_fields)
}

/// Derive the store key identifying `record`
///
/// Fails with [`KeyError::Missing`] listing every absent key field, or
/// [`KeyError::Unsupported`] for values no key component represents.
pub fn entity_key(
    record: &Record,
    descriptor: &EntityDescriptor,
    prefix_field_names: bool,
) -> Result<Key, KeyError> {
    let missing = missing_key_fields(record, descriptor);
    if !missing.is_empty() {
        return Err(KeyError::Missing { fields: missing });
    }

    let mut key = Key::from_parts(vec![KeyPart::from(descriptor.name.as_str())]);
    for field in &descriptor.key_fields {
        if prefix_field_names {
            key.push(KeyPart::from(field.as_str()));
        }
        key.push(key_part(field, record.get(field))?);
    }
    Ok(key)
}

/// Derive the target key (or scan prefix, for `Many`) of `relation` from
/// the owner `record`
///
/// Components come from the owner's `foreign_key_fields`, paired
/// positionally with the target's key-field names in prefixed mode.
pub fn relation_key(
    record: &Record,
    relation: &RelationDescriptor,
    target: &EntityDescriptor,
    prefix_field_names: bool,
) -> Result<Key, KeyError> {
    let missing = record::missing_fields(record, &relation.foreign_key_fields);
    if !missing.is_empty() {
        return Err(KeyError::Missing { fields: missing });
    }

    let mut key = Key::from_parts(vec![KeyPart::from(target.name.as_str())]);
    for (position, field) in relation.foreign_key_fields.iter().enumerate() {
        if prefix_field_names {
            // The stored layout uses the target's own field names
            let stored_name = target
                .key_fields
                .get(position)
                .map(String::as_str)
                .unwrap_or(field.as_str());
            key.push(KeyPart::from(stored_name));
        }
        key.push(key_part(field, record.get(field))?);
    }
    debug_assert!(
        relation.foreign_key_fields.len() <= target.key_fields.len(),
        "foreign keys longer than the target key"
    );
    Ok(key)
}

fn key_part(field: &str, value: Option<&Value>) -> Result<KeyPart, KeyError> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Ok(KeyPart::Str(s.clone())),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(KeyPart::Int)
            .ok_or_else(|| KeyError::Unsupported {
                field: field.to_string(),
            }),
        Some(Value::Bool(b)) => Ok(KeyPart::Bool(*b)),
        None | Some(Value::Null) | Some(Value::String(_)) => Err(KeyError::Missing {
            fields: vec![field.to_string()],
        }),
        Some(_) => Err(KeyError::Unsupported {
            field: field.to_string(),
        }),
    }
}
