//! Normalization planning: the pure, deterministic half of the
//! preview/apply workflow.
//!
//! `compute_plan` never writes. Preview runs it against a read
//! connection and reports; apply re-runs it inside the write transaction
//! and compares preview ids, so a plan that drifted between the two calls
//! is rejected instead of silently overwritten.

use std::collections::BTreeSet;

use rusqlite::Connection;

use engram_core::config::MergeConfig;
use engram_core::models::TagChange;
use engram_core::traits::TextEncoder;
use engram_core::EngramResult;
use engram_tags::{TagNormalizer, TagVocabulary};

use crate::queries::{snapshot_ops, tag_ops};

/// A computed remapping plan plus the aggregates preview reports.
pub struct NormalizePlan {
    /// Memories whose tags would change, ascending by id.
    pub changes: Vec<TagChange>,
    /// Canonical tags the plan would create, with their embeddings, in
    /// creation order.
    pub new_canonical: Vec<(String, Vec<f32>)>,
    pub total_memories_scanned: usize,
    pub unique_tags_before: usize,
    pub unique_tags_after: usize,
    /// Individual tag remappings: tags that leave a memory's array.
    pub planned_updates_count: usize,
    pub threshold: f32,
    /// 16-hex digest of (changes, threshold, model id).
    pub preview_id: String,
}

/// Walk every memory in ascending id order through one `TagNormalizer`
/// seeded with the persisted canonical vocabulary. The vocabulary
/// accumulates in memory as the walk proceeds, so later memories see
/// canonical tags the plan itself introduced — and a re-run over the same
/// state reproduces the identical plan.
pub fn compute_plan(
    conn: &Connection,
    encoder: &dyn TextEncoder,
    config: MergeConfig,
    model_name: &str,
) -> EngramResult<NormalizePlan> {
    let state = snapshot_ops::read_tag_state(conn)?;
    let canonical = tag_ops::load_canonical(conn)?;
    let preexisting = canonical.len();
    let vocab = TagVocabulary::from_entries(canonical);
    let threshold = config.similarity_threshold;
    let mut normalizer = TagNormalizer::new(vocab, encoder, config);

    let mut changes = Vec::new();
    let mut tags_before: BTreeSet<String> = BTreeSet::new();
    let mut tags_after: BTreeSet<String> = BTreeSet::new();
    let mut planned_updates = 0usize;
    let mut created: Vec<String> = Vec::new();

    for (memory_id, old_tags) in &state {
        let outcome = normalizer.normalize(old_tags)?;
        created.extend(outcome.created.iter().cloned());

        tags_before.extend(old_tags.iter().cloned());
        tags_after.extend(outcome.tags.iter().cloned());

        if &outcome.tags != old_tags {
            let old_set: BTreeSet<&String> = old_tags.iter().collect();
            let new_set: BTreeSet<&String> = outcome.tags.iter().collect();
            planned_updates += old_set.difference(&new_set).count();

            changes.push(TagChange {
                memory_id: *memory_id,
                old_tags: old_tags.clone(),
                new_tags: outcome.tags,
            });
        }
    }

    let vocab = normalizer.into_vocabulary();
    let new_canonical = created
        .into_iter()
        .filter_map(|tag| {
            vocab
                .embedding(&tag)
                .map(|embedding| (tag.clone(), embedding.to_vec()))
        })
        .collect();
    debug_assert!(vocab.len() >= preexisting);

    let preview_id = preview_digest(&changes, threshold, model_name)?;

    Ok(NormalizePlan {
        changes,
        new_canonical,
        total_memories_scanned: state.len(),
        unique_tags_before: tags_before.len(),
        unique_tags_after: tags_after.len(),
        planned_updates_count: planned_updates,
        threshold,
        preview_id,
    })
}

/// Deterministic 16-hex preview id over the sorted change list, the
/// similarity threshold, and the embedding-model identifier.
pub fn preview_digest(
    changes: &[TagChange],
    threshold: f32,
    model_name: &str,
) -> EngramResult<String> {
    let mut hasher = blake3::Hasher::new();
    for change in changes {
        let line = format!(
            "{}|{}|{}\n",
            change.memory_id,
            serde_json::to_string(&change.old_tags)?,
            serde_json::to_string(&change.new_tags)?,
        );
        hasher.update(line.as_bytes());
    }
    hasher.update(format!("threshold={threshold}|model={model_name}").as_bytes());
    Ok(hasher.finalize().to_hex()[..16].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(id: i64, old: &[&str], new: &[&str]) -> TagChange {
        TagChange {
            memory_id: id,
            old_tags: old.iter().map(|s| s.to_string()).collect(),
            new_tags: new.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn digest_is_deterministic() {
        let changes = vec![change(1, &["a"], &["b"])];
        assert_eq!(
            preview_digest(&changes, 0.85, "m").unwrap(),
            preview_digest(&changes, 0.85, "m").unwrap()
        );
    }

    #[test]
    fn digest_depends_on_plan_threshold_and_model() {
        let changes = vec![change(1, &["a"], &["b"])];
        let base = preview_digest(&changes, 0.85, "m").unwrap();
        assert_ne!(
            base,
            preview_digest(&[change(1, &["a"], &["c"])], 0.85, "m").unwrap()
        );
        assert_ne!(base, preview_digest(&changes, 0.80, "m").unwrap());
        assert_ne!(base, preview_digest(&changes, 0.85, "other-model").unwrap());
    }

    #[test]
    fn empty_plan_still_digests() {
        let d = preview_digest(&[], 0.85, "m").unwrap();
        assert_eq!(d.len(), 16);
    }
}
