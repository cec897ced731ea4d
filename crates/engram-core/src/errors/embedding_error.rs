/// Embedding-provider errors.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("provider '{name}' unavailable: {reason}")]
    ProviderUnavailable { name: String, reason: String },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("encoding failed: {message}")]
    EncodeFailed { message: String },
}
