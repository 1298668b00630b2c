use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by a key-value store backend
///
/// Backends wrap their native failures into `Backend`; the persistence
/// layer above passes these through unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The underlying backend failed to serve the request
    #[error("storage backend failure: {reason}")]
    Backend { reason: String },
}

impl StoreError {
    /// Wrap a backend failure message
    pub fn backend(reason: impl Into<String>) -> Self {
        StoreError::Backend {
            reason: reason.into(),
        }
    }
}
