//! Signed feature hashing ("the hashing trick").
//!
//! Each term is mixed into a 64-bit signature; the high bits pick a
//! bucket, the low bit picks a sign, and repeated terms weigh in
//! sublinearly. No vocabulary and no external model, so the output is
//! identical across platforms — which the workflow's id digests rely on.

use std::collections::BTreeMap;

use engram_core::traits::TextEncoder;
use engram_core::EngramResult;

/// Deterministic dense-vector provider.
///
/// Far less expressive than a neural model, but always available and
/// unit-normalized like every other provider. The signed projection
/// keeps disjoint vocabularies near-orthogonal in expectation instead of
/// letting bucket collisions only ever add up.
pub struct FeatureHasher {
    dimensions: usize,
}

impl FeatureHasher {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Mix a term into a 64-bit signature: fold each byte into the state
    /// with a golden-ratio multiply, then stir the high bits back down.
    fn signature(term: &str) -> u64 {
        let mut state: u64 = 0x243f_6a88_85a3_08d3;
        for &byte in term.as_bytes() {
            state = (state ^ u64::from(byte)).wrapping_mul(0x9e37_79b9_7f4a_7c15);
            state ^= state >> 29;
        }
        state
    }

    /// Lowercased alphanumeric runs with their occurrence counts.
    /// Underscores and punctuation split terms.
    fn term_counts(text: &str) -> BTreeMap<String, u32> {
        let mut counts = BTreeMap::new();
        for term in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            *counts.entry(term.to_string()).or_insert(0u32) += 1;
        }
        counts
    }

    fn project(&self, text: &str) -> Vec<f32> {
        let counts = Self::term_counts(text);
        let mut vector = vec![0.0f32; self.dimensions];
        if counts.is_empty() {
            return vector;
        }

        for (term, count) in &counts {
            let signature = Self::signature(term);
            let bucket = ((signature >> 1) % self.dimensions as u64) as usize;
            let sign = if signature & 1 == 0 { 1.0f32 } else { -1.0f32 };
            // Sublinear term weight: a term repeated n times counts sqrt(n).
            vector[bucket] += sign * (*count as f32).sqrt();
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl TextEncoder for FeatureHasher {
    fn encode_single(&self, text: &str) -> EngramResult<Vec<f32>> {
        Ok(self.project(text))
    }

    fn encode_batch(&self, texts: &[String]) -> EngramResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.project(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "feature-hash"
    }
}
