//! Property tests: the merge predicate is symmetric and the version guard
//! is absolute.

use proptest::prelude::*;

use engram_core::config::MergeConfig;
use engram_tags::analyzer::extract_version;
use engram_tags::can_merge;

fn tag_strategy() -> impl Strategy<Value = String> {
    // Tag-shaped strings: words, separators, versions, colons, numbers.
    proptest::string::string_regex(
        "[a-z]{1,8}(([-_: ])([a-z]{1,8}|v[0-9]{1,2}|[0-9]{1,4}(\\.[0-9]{1,2})?)){0,3}",
    )
    .expect("tag regex strategy")
}

proptest! {
    #[test]
    fn can_merge_is_symmetric(
        a in tag_strategy(),
        b in tag_strategy(),
        sim in 0.0f32..=1.0f32,
    ) {
        let cfg = MergeConfig::default();
        prop_assert_eq!(can_merge(&a, &b, sim, &cfg), can_merge(&b, &a, sim, &cfg));
    }

    #[test]
    fn differing_versions_refuse_at_any_similarity(
        a in tag_strategy(),
        b in tag_strategy(),
        sim in 0.0f32..=1.0f32,
    ) {
        let cfg = MergeConfig::default();
        if let (Some(va), Some(vb)) = (extract_version(&a), extract_version(&b)) {
            if va != vb {
                prop_assert!(!can_merge(&a, &b, sim, &cfg));
            }
        }
    }

    #[test]
    fn below_both_thresholds_never_merges(
        a in tag_strategy(),
        b in tag_strategy(),
    ) {
        let cfg = MergeConfig::default();
        // Even with the substring boost, similarity this low cannot clear
        // the related threshold.
        let sim = cfg.related_threshold - cfg.substring_boost - 0.01;
        prop_assert!(!can_merge(&a, &b, sim, &cfg));
    }
}

#[test]
fn colon_guard_concrete_cases() {
    let cfg = MergeConfig::default();
    assert!(!can_merge("type:refactor", "type:bug", 1.0, &cfg));
    assert!(!can_merge("type:refactor", "refactor", 1.0, &cfg));
}
