//! Hybrid category classification: exact match, short-alias table, then
//! embedding nearest-neighbour with a threshold and a margin over `other`.

use tracing::debug;

use engram_core::constants::{CATEGORY_MIN_MARGIN, CATEGORY_SIMILARITY_THRESHOLD};
use engram_core::traits::{inner_product, TextEncoder};
use engram_core::{EngramResult, MemoryCategory};

/// Maps arbitrary category strings onto the closed canonical set.
///
/// Label embeddings are computed once at construction. Construct this
/// inside the same gated one-time initialization as the embedding model so
/// the labels are embedded at most once per process.
pub struct CategoryClassifier {
    label_embeddings: Vec<(MemoryCategory, Vec<f32>)>,
}

impl CategoryClassifier {
    /// Embed every canonical category's human-readable label.
    pub fn new(encoder: &dyn TextEncoder) -> EngramResult<Self> {
        let mut label_embeddings = Vec::with_capacity(MemoryCategory::ALL.len());
        for category in MemoryCategory::ALL {
            let embedding = encoder.encode_single(category.embedding_label())?;
            label_embeddings.push((category, embedding));
        }
        Ok(Self { label_embeddings })
    }

    /// Classify an input string onto the canonical set. Unknown or
    /// low-confidence inputs land on `Other`.
    pub fn classify(&self, input: &str, encoder: &dyn TextEncoder) -> EngramResult<MemoryCategory> {
        let lowered = input.trim().to_lowercase();
        if lowered.is_empty() {
            return Ok(MemoryCategory::Other);
        }

        if let Some(category) = MemoryCategory::parse(&lowered) {
            return Ok(category);
        }

        // Embeddings are unreliable for very short tokens; a fixed alias
        // table covers the common abbreviations.
        if lowered.chars().count() < 5 {
            if let Some(category) = MemoryCategory::short_alias(&lowered) {
                return Ok(category);
            }
        }

        let input_embedding = encoder.encode_single(&lowered)?;

        let mut best: Option<(MemoryCategory, f32)> = None;
        let mut other_score = 0.0f32;
        for (category, label_embedding) in &self.label_embeddings {
            let score = inner_product(&input_embedding, label_embedding);
            if *category == MemoryCategory::Other {
                other_score = score;
            } else if best.map_or(true, |(_, b)| score > b) {
                best = Some((*category, score));
            }
        }

        match best {
            Some((category, score))
                if score >= CATEGORY_SIMILARITY_THRESHOLD
                    && score >= other_score + CATEGORY_MIN_MARGIN =>
            {
                debug!(input = %lowered, category = %category, score, "classified category");
                Ok(category)
            }
            _ => Ok(MemoryCategory::Other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StubEncoder {
        table: HashMap<String, Vec<f32>>,
        dims: usize,
    }

    impl StubEncoder {
        fn new(dims: usize, entries: &[(&str, Vec<f32>)]) -> Self {
            let table = entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect();
            Self { table, dims }
        }
    }

    impl TextEncoder for StubEncoder {
        fn encode_single(&self, text: &str) -> EngramResult<Vec<f32>> {
            Ok(self
                .table
                .get(text)
                .cloned()
                .unwrap_or_else(|| vec![0.0; self.dims]))
        }

        fn dimensions(&self) -> usize {
            self.dims
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn axis(dims: usize, i: usize) -> Vec<f32> {
        let mut v = vec![0.0; dims];
        v[i] = 1.0;
        v
    }

    /// Encoder whose label embeddings occupy one axis per category.
    fn label_encoder(extra: &[(&str, Vec<f32>)]) -> StubEncoder {
        let dims = 16;
        let mut entries: Vec<(&str, Vec<f32>)> = MemoryCategory::ALL
            .iter()
            .enumerate()
            .map(|(i, c)| (c.embedding_label(), axis(dims, i)))
            .collect();
        entries.extend_from_slice(extra);
        StubEncoder::new(dims, &entries)
    }

    #[test]
    fn exact_canonical_string_short_circuits() {
        let encoder = label_encoder(&[]);
        let classifier = CategoryClassifier::new(&encoder).unwrap();
        assert_eq!(
            classifier.classify("  Security ", &encoder).unwrap(),
            MemoryCategory::Security
        );
    }

    #[test]
    fn short_aliases_bypass_embeddings() {
        let encoder = label_encoder(&[]);
        let classifier = CategoryClassifier::new(&encoder).unwrap();
        assert_eq!(
            classifier.classify("perf", &encoder).unwrap(),
            MemoryCategory::Performance
        );
        assert_eq!(
            classifier.classify("auth", &encoder).unwrap(),
            MemoryCategory::Security
        );
    }

    #[test]
    fn empty_input_is_other() {
        let encoder = label_encoder(&[]);
        let classifier = CategoryClassifier::new(&encoder).unwrap();
        assert_eq!(
            classifier.classify("   ", &encoder).unwrap(),
            MemoryCategory::Other
        );
    }

    #[test]
    fn nearest_label_wins_when_confident() {
        // "vulnerability scanning" sits on the security axis (index 7).
        let mut v = vec![0.0; 16];
        v[7] = 0.9;
        let encoder = label_encoder(&[("vulnerability scanning", v)]);
        let classifier = CategoryClassifier::new(&encoder).unwrap();
        assert_eq!(
            classifier.classify("vulnerability scanning", &encoder).unwrap(),
            MemoryCategory::Security
        );
    }

    #[test]
    fn low_similarity_falls_back_to_other() {
        let encoder = label_encoder(&[]);
        let classifier = CategoryClassifier::new(&encoder).unwrap();
        // Unknown text embeds to the zero vector: below every threshold.
        assert_eq!(
            classifier.classify("zzzzz", &encoder).unwrap(),
            MemoryCategory::Other
        );
    }

    #[test]
    fn insufficient_margin_over_other_falls_back() {
        // Input equally close to `security` and `other`.
        let mut v = vec![0.0; 16];
        v[7] = 0.7;
        v[8] = 0.7;
        let encoder = label_encoder(&[("ambiguous topic", v)]);
        let classifier = CategoryClassifier::new(&encoder).unwrap();
        assert_eq!(
            classifier.classify("ambiguous topic", &encoder).unwrap(),
            MemoryCategory::Other
        );
    }
}
