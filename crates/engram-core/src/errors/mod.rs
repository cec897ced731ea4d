mod embedding_error;
mod engram_error;
mod storage_error;

pub use embedding_error::EmbeddingError;
pub use engram_error::{EngramError, EngramResult};
pub use storage_error::StorageError;
