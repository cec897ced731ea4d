//! # engram-core
//!
//! Foundation crate for the Engram memory store.
//! Defines the data model, result records, errors, config, constants,
//! the embedding-provider trait, and boundary validation.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod memory;
pub mod models;
pub mod traits;
pub mod validation;

// Re-export the most commonly used types at the crate root.
pub use config::EngramConfig;
pub use errors::{EngramError, EngramResult};
pub use memory::{MemoryCategory, MemoryEntry};
pub use traits::TextEncoder;
