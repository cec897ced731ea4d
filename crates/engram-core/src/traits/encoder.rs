use crate::errors::EngramResult;

/// Text embedding provider.
///
/// Implementations must return unit-normalized vectors, so the inner
/// product of two encodings equals their cosine similarity.
pub trait TextEncoder: Send + Sync {
    /// Embed a single text, returning a vector of `dimensions()` floats.
    fn encode_single(&self, text: &str) -> EngramResult<Vec<f32>>;

    /// Embed a batch of texts.
    fn encode_batch(&self, texts: &[String]) -> EngramResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.encode_single(t)).collect()
    }

    /// Inner products of the query's embedding against each candidate's.
    /// Equals cosine similarity because vectors are unit-norm.
    fn batch_similarity(&self, query: &str, candidates: &[String]) -> EngramResult<Vec<f32>> {
        let query_vec = self.encode_single(query)?;
        let candidate_vecs = self.encode_batch(candidates)?;
        Ok(candidate_vecs
            .iter()
            .map(|c| inner_product(&query_vec, c))
            .collect())
    }

    /// The dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Human-readable provider name; participates in preview-id derivation.
    fn name(&self) -> &str;
}

/// f32 inner product. Deliberately not widened to f64: thresholds must be
/// stable across platforms and match the stored f32 vectors.
pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_product_of_unit_vectors() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert_eq!(inner_product(&a, &a), 1.0);
        assert_eq!(inner_product(&a, &b), 0.0);
    }
}
