//! # engram-storage
//!
//! SQLite persistence layer for the Engram memory store.
//! Single write connection + read pool (WAL mode), the full memory
//! operation surface, the canonical tag store, and the
//! snapshot / preview / apply / restore normalization workflow.

pub mod engine;
pub mod migrations;
pub mod normalize;
pub mod pool;
pub mod queries;
pub mod service;

pub use engine::MemoryStore;
pub use service::MemoryService;

/// Helper to convert a string message into an `EngramError::Storage`.
pub fn to_storage_err(msg: String) -> engram_core::EngramError {
    engram_core::EngramError::Storage(engram_core::errors::StorageError::SqliteError {
        message: msg,
    })
}
