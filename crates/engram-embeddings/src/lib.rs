//! # engram-embeddings
//!
//! Thin facade over the embedding provider: write-through caching,
//! unit-norm enforcement, and a deterministic signed feature-hashing
//! fallback that needs no external model.
//!
//! The neural model itself is an external collaborator; anything that
//! implements [`engram_core::TextEncoder`] plugs in.

pub mod engine;
pub mod providers;

pub use engine::EmbeddingEngine;
pub use providers::FeatureHasher;
