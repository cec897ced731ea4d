use super::{EmbeddingError, StorageError};

/// Top-level error type for the Engram memory store.
/// All subsystem errors convert into this via `From` impls.
///
/// Soft failures (duplicate content, capacity, missing snapshot, preview
/// mismatch) are NOT errors — they are `success: false` result records.
#[derive(Debug, thiserror::Error)]
pub enum EngramError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl EngramError {
    /// Shorthand for a validation failure at the call boundary.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// Convenience type alias.
pub type EngramResult<T> = Result<T, EngramError>;
