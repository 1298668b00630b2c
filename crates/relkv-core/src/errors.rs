use relkv_store::{Key, StoreError};
use thiserror::Error;

/// Result type alias using RelKvError
pub type Result<T> = std::result::Result<T, RelKvError>;

/// Categorical error taxonomy
///
/// Every error maps to one of these kinds with a stable code string,
/// usable for programmatic handling and assertions without matching on
/// individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Instance construction failed before any store I/O
    Initialization,
    /// A record handed to `save` failed key validation
    SaveValidation,
    /// A lookup request failed key validation
    FindValidation,
    /// A delete request failed key validation or targeted a missing record
    DeleteValidation,
    /// A field value cannot be turned into a key component
    KeyDerivation,
    /// The underlying store failed; surfaced unchanged
    Store,
    /// Invariant breach inside the engine
    Internal,
}

impl ErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Initialization => "ERR_INITIALIZATION",
            ErrorKind::SaveValidation => "ERR_SAVE_VALIDATION",
            ErrorKind::FindValidation => "ERR_FIND_VALIDATION",
            ErrorKind::DeleteValidation => "ERR_DELETE_VALIDATION",
            ErrorKind::KeyDerivation => "ERR_KEY_DERIVATION",
            ErrorKind::Store => "ERR_STORE",
            ErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Error taxonomy for RelKV operations
///
/// Validation and initialization errors are raised before any store
/// mutation is staged, so no partial state can exist when they surface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelKvError {
    // ===== Initialization Errors =====
    /// An instance under this name already exists in the manager
    #[error("'{name}' an instance under this name already exists")]
    DuplicateInstanceName { name: String },

    /// A requested entity was never registered
    #[error("'{entity}' entity not found in registry")]
    EntityNotRegistered { entity: String },

    /// A requested entity is registered more than once
    #[error("'{entity}' entity is registered more than once, binding is ambiguous")]
    AmbiguousEntityBinding { entity: String },

    /// A relation points at an entity outside the bound set
    #[error("relation '{local_field}' on entity '{entity}' targets unknown entity '{target}'")]
    UnknownRelationTarget {
        entity: String,
        local_field: String,
        target: String,
    },

    /// A relation's shape cannot address its target
    #[error("relation '{local_field}' on entity '{entity}' is invalid: {reason}")]
    InvalidRelation {
        entity: String,
        local_field: String,
        reason: String,
    },

    /// No instance is registered under this name
    #[error("instance '{name}' not found")]
    InstanceNotFound { name: String },

    // ===== Validation Errors =====
    /// A record being saved is missing key field values
    #[error("object is missing key values [{}]", fields.join(","))]
    SaveMissingKeys { fields: Vec<String> },

    /// A lookup request is missing key field values
    #[error("object is missing key values [{}]", fields.join(","))]
    FindMissingKeys { fields: Vec<String> },

    /// A delete request is missing key field values
    #[error("object is missing key values [{}]", fields.join(","))]
    DeleteMissingKeys { fields: Vec<String> },

    /// A delete targeted a record that does not exist
    #[error("entity not found for keys {key}")]
    DeleteTargetNotFound { key: Key },

    /// A key field holds a value that cannot become a key component
    #[error("field '{field}' holds a value that cannot be used as a key component")]
    UnsupportedKeyValue { field: String },

    // ===== Store Errors =====
    /// Failure from the underlying store, surfaced unchanged
    #[error(transparent)]
    Store(#[from] StoreError),

    // ===== Internal Errors =====
    /// Generic internal error
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl RelKvError {
    /// The categorical kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelKvError::DuplicateInstanceName { .. }
            | RelKvError::EntityNotRegistered { .. }
            | RelKvError::AmbiguousEntityBinding { .. }
            | RelKvError::UnknownRelationTarget { .. }
            | RelKvError::InvalidRelation { .. }
            | RelKvError::InstanceNotFound { .. } => ErrorKind::Initialization,
            RelKvError::SaveMissingKeys { .. } => ErrorKind::SaveValidation,
            RelKvError::FindMissingKeys { .. } => ErrorKind::FindValidation,
            RelKvError::DeleteMissingKeys { .. } | RelKvError::DeleteTargetNotFound { .. } => {
                ErrorKind::DeleteValidation
            }
            RelKvError::UnsupportedKeyValue { .. } => ErrorKind::KeyDerivation,
            RelKvError::Store(_) => ErrorKind::Store,
            RelKvError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// The stable code of this error's kind
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }
}
