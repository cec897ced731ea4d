//! Semantic tag normalization against a canonical vocabulary.
//!
//! `TagNormalizer` is a pure planner: it maps input tags onto canonical
//! forms and records which canonical tags were adopted and which were
//! newly created, without touching storage. The storage layer persists
//! the outcome (store path) or discards it (preview path); both share
//! this one code path, which is what makes preview/apply ids line up.

use std::collections::HashMap;

use tracing::debug;

use engram_core::config::MergeConfig;
use engram_core::traits::{inner_product, TextEncoder};
use engram_core::EngramResult;

use crate::analyzer::normalize_for_embedding;
use crate::merge::can_merge;

/// Insertion-ordered canonical tag vocabulary. Order matters: merge ties
/// keep the first candidate encountered, mirroring the store's row order.
#[derive(Debug, Clone, Default)]
pub struct TagVocabulary {
    entries: Vec<(String, Vec<f32>)>,
    index: HashMap<String, usize>,
}

impl TagVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(tag, embedding)` pairs in store insertion order.
    pub fn from_entries(entries: Vec<(String, Vec<f32>)>) -> Self {
        let mut vocab = Self::new();
        for (tag, embedding) in entries {
            vocab.push(tag, embedding);
        }
        vocab
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.index.contains_key(tag)
    }

    /// Append a tag if absent.
    pub fn push(&mut self, tag: String, embedding: Vec<f32>) {
        if self.index.contains_key(&tag) {
            return;
        }
        self.index.insert(tag.clone(), self.entries.len());
        self.entries.push((tag, embedding));
    }

    pub fn embedding(&self, tag: &str) -> Option<&[f32]> {
        self.index.get(tag).map(|&i| self.entries[i].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.entries.iter().map(|(t, e)| (t.as_str(), e.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of normalizing one batch of tags.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOutcome {
    /// Canonical tags in first-seen order, no duplicates.
    pub tags: Vec<String>,
    /// Pre-existing canonical tags adopted by this batch; each appears at
    /// most once and should have its frequency incremented exactly once.
    pub adopted: Vec<String>,
    /// Tags added to the vocabulary by this batch (frequency starts at 1).
    pub created: Vec<String>,
}

/// Maps input tags onto canonical forms, growing the vocabulary as it goes
/// so later tags in the same batch see earlier additions.
pub struct TagNormalizer<'a> {
    vocab: TagVocabulary,
    encoder: &'a dyn TextEncoder,
    config: MergeConfig,
}

impl<'a> TagNormalizer<'a> {
    pub fn new(vocab: TagVocabulary, encoder: &'a dyn TextEncoder, config: MergeConfig) -> Self {
        Self {
            vocab,
            encoder,
            config,
        }
    }

    pub fn vocabulary(&self) -> &TagVocabulary {
        &self.vocab
    }

    pub fn into_vocabulary(self) -> TagVocabulary {
        self.vocab
    }

    /// Normalize a batch of tags. For each input, in order:
    /// exact canonical hit, else best mergeable canonical by similarity,
    /// else a new canonical entry.
    pub fn normalize(&mut self, tags: &[String]) -> EngramResult<NormalizeOutcome> {
        let mut outcome = NormalizeOutcome::default();

        for tag in tags {
            let tag_lower = tag.trim().to_lowercase();
            if tag_lower.is_empty() {
                continue;
            }

            // Exact hit on the canonical set.
            if self.vocab.contains(&tag_lower) {
                let created_this_batch = outcome.created.contains(&tag_lower);
                adopt(&mut outcome, tag_lower, created_this_batch);
                continue;
            }

            let tag_norm = normalize_for_embedding(&tag_lower);
            let tag_embedding = self.encoder.encode_single(&tag_norm)?;

            // Best mergeable candidate by similarity; ties keep the first.
            let mut best_match: Option<String> = None;
            let mut best_similarity = 0.0f32;
            for (candidate, candidate_embedding) in self.vocab.iter() {
                let similarity = inner_product(&tag_embedding, candidate_embedding);
                if can_merge(
                    &tag_norm,
                    &normalize_for_embedding(candidate),
                    similarity,
                    &self.config,
                ) && similarity > best_similarity
                {
                    best_similarity = similarity;
                    best_match = Some(candidate.to_string());
                }
            }

            match best_match {
                Some(canonical) => {
                    debug!(input = %tag_lower, canonical = %canonical, similarity = best_similarity, "merged tag");
                    let created_this_batch = outcome.created.contains(&canonical);
                    adopt(&mut outcome, canonical, created_this_batch);
                }
                None => {
                    self.vocab.push(tag_lower.clone(), tag_embedding);
                    outcome.created.push(tag_lower.clone());
                    if !outcome.tags.contains(&tag_lower) {
                        outcome.tags.push(tag_lower);
                    }
                }
            }
        }

        Ok(outcome)
    }
}

/// Record an adopted canonical tag, deduplicating and tracking the
/// at-most-one frequency increment per batch. Tags created earlier in the
/// same batch keep their initial frequency.
fn adopt(outcome: &mut NormalizeOutcome, canonical: String, created_this_batch: bool) {
    if !outcome.tags.contains(&canonical) {
        outcome.tags.push(canonical.clone());
    }
    if !created_this_batch && !outcome.adopted.contains(&canonical) {
        outcome.adopted.push(canonical);
    }
}
