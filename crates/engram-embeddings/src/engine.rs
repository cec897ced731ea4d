//! EmbeddingEngine — the main entry point for engram-embeddings.
//!
//! Wraps a provider with write-through caching, unit-norm enforcement,
//! and dimension validation. Implements `TextEncoder`, so it can stand in
//! anywhere a provider is expected.

use moka::sync::Cache;
use tracing::{debug, info};

use engram_core::config::EmbeddingConfig;
use engram_core::errors::EmbeddingError;
use engram_core::traits::TextEncoder;
use engram_core::EngramResult;

use crate::providers::FeatureHasher;

/// Caching facade over an embedding provider.
///
/// The cache is keyed by blake3 text hash and bounded by entry count
/// only: an embedding of a fixed text never goes stale under a fixed
/// provider, so there is nothing to expire.
pub struct EmbeddingEngine {
    provider: Box<dyn TextEncoder>,
    cache: Cache<String, Vec<f32>>,
    model_name: String,
    dimensions: usize,
}

impl EmbeddingEngine {
    /// Wrap an arbitrary provider. Fails fast when the provider's
    /// dimensionality disagrees with the config.
    pub fn new(provider: Box<dyn TextEncoder>, config: &EmbeddingConfig) -> EngramResult<Self> {
        if provider.dimensions() != config.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: config.dimensions,
                actual: provider.dimensions(),
            }
            .into());
        }

        info!(
            provider = provider.name(),
            dims = config.dimensions,
            cache_entries = config.l1_cache_size,
            "embedding engine initialized"
        );

        Ok(Self {
            provider,
            cache: Cache::new(config.l1_cache_size),
            model_name: config.model.clone(),
            dimensions: config.dimensions,
        })
    }

    /// Engine backed by the deterministic feature-hashing fallback.
    pub fn with_fallback(config: &EmbeddingConfig) -> EngramResult<Self> {
        Self::new(Box::new(FeatureHasher::new(config.dimensions)), config)
    }

    /// The configured model identifier (participates in preview ids).
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn cache_key(text: &str) -> String {
        blake3::hash(text.as_bytes()).to_hex().to_string()
    }

    /// Re-normalize to unit length; zero vectors pass through unchanged.
    fn renormalize(mut v: Vec<f32>) -> Vec<f32> {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

impl TextEncoder for EmbeddingEngine {
    fn encode_single(&self, text: &str) -> EngramResult<Vec<f32>> {
        let key = Self::cache_key(text);
        if let Some(cached) = self.cache.get(&key) {
            debug!(hash = %key, "embedding cache hit");
            return Ok(cached);
        }

        let embedding = self.provider.encode_single(text)?;
        if embedding.len() != self.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            }
            .into());
        }
        let embedding = Self::renormalize(embedding);

        self.cache.insert(key, embedding.clone());
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        self.provider.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_engine() -> EmbeddingEngine {
        EmbeddingEngine::with_fallback(&EmbeddingConfig {
            dimensions: 128,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn encode_returns_configured_dims() {
        let engine = default_engine();
        assert_eq!(engine.encode_single("test query").unwrap().len(), 128);
    }

    #[test]
    fn cached_encode_is_identical() {
        let engine = default_engine();
        let a = engine.encode_single("cached query").unwrap();
        let b = engine.encode_single("cached query").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn outputs_are_unit_norm() {
        let engine = default_engine();
        let v = engine.encode_single("normalize me please").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let provider = Box::new(FeatureHasher::new(64));
        let config = EmbeddingConfig {
            dimensions: 128,
            ..Default::default()
        };
        assert!(EmbeddingEngine::new(provider, &config).is_err());
    }

    #[test]
    fn batch_similarity_uses_inner_products() {
        let engine = default_engine();
        let sims = engine
            .batch_similarity(
                "vector search",
                &[
                    "vector search engine".to_string(),
                    "gardening tips".to_string(),
                ],
            )
            .unwrap();
        assert_eq!(sims.len(), 2);
        assert!(sims[0] > sims[1]);
    }
}
