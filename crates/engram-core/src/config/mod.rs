use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: PathBuf,
    /// Hard cap on stored memories.
    pub memory_limit: usize,
    /// Read connections in the WAL pool.
    pub read_pool_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("memory/engram.db"),
            memory_limit: constants::MAX_TOTAL_MEMORIES,
            read_pool_size: 4,
        }
    }
}

/// Embedding-provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model identifier; participates in preview-id derivation.
    pub model: String,
    pub dimensions: usize,
    /// Max entries in the L1 embedding cache.
    pub l1_cache_size: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: constants::EMBEDDING_MODEL.to_string(),
            dimensions: constants::EMBEDDING_DIM,
            l1_cache_size: 10_000,
        }
    }
}

/// Tag-merge predicate parameters. Defaults come from `constants`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub similarity_threshold: f32,
    /// Used instead of `similarity_threshold` when both tags carry the
    /// same version.
    pub related_threshold: f32,
    pub substring_min_length: usize,
    pub substring_boost: f32,
    pub stop_words: Vec<String>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: constants::TAG_SIMILARITY_THRESHOLD,
            related_threshold: constants::TAG_RELATED_THRESHOLD,
            substring_min_length: constants::TAG_SUBSTRING_MIN_LENGTH,
            substring_boost: constants::TAG_SUBSTRING_BOOST,
            stop_words: constants::TAG_SUBSTRING_STOP_WORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl MergeConfig {
    /// Same config with a different default similarity threshold, as used
    /// by preview/apply when the operator overrides it.
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }
}

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngramConfig {
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub tags: MergeConfig,
}

impl EngramConfig {
    /// Load config from a TOML string, falling back to defaults for
    /// missing fields.
    pub fn from_toml(toml_str: &str) -> crate::EngramResult<Self> {
        toml::from_str(toml_str).map_err(|e| crate::EngramError::Config(e.to_string()))
    }
}
