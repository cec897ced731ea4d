//! The tag-merge decision function.
//!
//! Version identifiers and structured `key:value` tags carry semantics
//! that cosine similarity cannot distinguish, so the guards run first and
//! the embedding score is consulted last.

use std::collections::BTreeSet;

use engram_core::config::MergeConfig;
use engram_core::constants::TAG_NUMBER_GUARD_THRESHOLD;

use crate::analyzer::{extract_numbers, extract_version, split_colon};

/// Decide whether two tags may collapse into one canonical form, given
/// their cosine similarity. Symmetric in `tag_a`/`tag_b`.
///
/// Guard order (first failure wins): version, colon, prefix asymmetry,
/// substring boost, threshold, number guard.
pub fn can_merge(tag_a: &str, tag_b: &str, similarity: f32, config: &MergeConfig) -> bool {
    let version_a = extract_version(tag_a);
    let version_b = extract_version(tag_b);

    // Different versions never merge.
    if let (Some(a), Some(b)) = (&version_a, &version_b) {
        if a != b {
            return false;
        }
    }

    let lower_a = tag_a.to_lowercase();
    let lower_b = tag_b.to_lowercase();

    let colon_a = split_colon(&lower_a);
    let colon_b = split_colon(&lower_b);
    // A tag only counts as structured when the prefix is non-empty.
    let structured_a = colon_a.as_ref().filter(|(p, _)| !p.is_empty());
    let structured_b = colon_b.as_ref().filter(|(p, _)| !p.is_empty());

    // Same prefix, different suffix: type:bug vs type:refactor.
    if let (Some((prefix_a, suffix_a)), Some((prefix_b, suffix_b))) = (structured_a, structured_b) {
        if prefix_a == prefix_b && suffix_a != suffix_b {
            return false;
        }
    }

    // Structured vs plain: type:refactor vs refactor.
    if structured_a.is_some() != structured_b.is_some() {
        return false;
    }

    let mut similarity = similarity;

    // Substring boost for non-versioned, non-structured, non-numeric tags:
    // "auth" inside "auth flow" deserves a nudge.
    if version_a.is_none() && version_b.is_none() && colon_a.is_none() && colon_b.is_none() {
        let numbers_a = extract_numbers(&lower_a);
        let numbers_b = extract_numbers(&lower_b);
        if numbers_a.is_empty() && numbers_b.is_empty() {
            if let Some(subset) = strict_word_subset(&lower_a, &lower_b) {
                let boostable = subset.iter().all(|word| {
                    word.chars().count() >= config.substring_min_length
                        && !config.stop_words.iter().any(|s| s == word)
                });
                if boostable {
                    similarity = (similarity + config.substring_boost).min(1.0);
                }
            }
        }
    }

    // Same version relaxes the threshold.
    let threshold = match (&version_a, &version_b) {
        (Some(a), Some(b)) if a == b => config.related_threshold,
        _ => config.similarity_threshold,
    };
    if similarity < threshold {
        return false;
    }

    // Differing numeric tokens demand near-identity.
    if version_a.is_none() && version_b.is_none() {
        let numbers_a = extract_numbers(&lower_a);
        let numbers_b = extract_numbers(&lower_b);
        if !numbers_a.is_empty()
            && !numbers_b.is_empty()
            && numbers_a != numbers_b
            && similarity < TAG_NUMBER_GUARD_THRESHOLD
        {
            return false;
        }
    }

    true
}

/// The smaller word set, when one tag's words are a strict subset of the
/// other's. `None` otherwise.
fn strict_word_subset<'a>(a: &'a str, b: &'a str) -> Option<BTreeSet<&'a str>> {
    let words_a: BTreeSet<&str> = a.split_whitespace().collect();
    let words_b: BTreeSet<&str> = b.split_whitespace().collect();
    if words_a.is_empty() || words_b.is_empty() {
        return None;
    }
    if words_a.is_subset(&words_b) && words_a != words_b {
        Some(words_a)
    } else if words_b.is_subset(&words_a) && words_b != words_a {
        Some(words_b)
    } else {
        None
    }
}
