use thiserror::Error;

/// Errors from identity store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint would be violated.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// A value failed data validation (empty name, value too long, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// The record to update or delete does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` for constraint failures that only affect the record
    /// being written. Everything else means the store itself is unusable.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Integrity(_) | Self::Validation(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
