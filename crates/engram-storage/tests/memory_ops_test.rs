//! Integration tests: store / get / delete / recent / cleanup / stats
//! lifecycle against an in-memory store with the deterministic fallback
//! encoder.

use engram_core::config::EngramConfig;
use engram_core::models::HealthStatus;
use engram_core::{MemoryCategory, TextEncoder};
use engram_embeddings::EmbeddingEngine;
use engram_storage::MemoryStore;
use engram_tags::CategoryClassifier;

struct Harness {
    store: MemoryStore,
    encoder: EmbeddingEngine,
    classifier: CategoryClassifier,
}

fn harness() -> Harness {
    harness_with_limit(engram_core::constants::MAX_TOTAL_MEMORIES)
}

fn harness_with_limit(memory_limit: usize) -> Harness {
    let mut config = EngramConfig::default();
    config.storage.memory_limit = memory_limit;
    let encoder = EmbeddingEngine::with_fallback(&config.embedding).unwrap();
    let classifier = CategoryClassifier::new(&encoder).unwrap();
    let store = MemoryStore::open_in_memory(config).unwrap();
    Harness {
        store,
        encoder,
        classifier,
    }
}

impl Harness {
    fn store_one(&self, content: &str, category: &str, tags: &[&str]) -> engram_core::models::StoreResult {
        let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
        self.store
            .store_memory(&self.encoder, &self.classifier, content, category, &tags)
            .unwrap()
    }
}

#[test]
fn store_and_get_roundtrip() {
    let h = harness();
    let result = h.store_one(
        "Use a binary search to locate the split point",
        "code-solution",
        &["algorithm", "binary-search"],
    );

    assert!(result.success);
    let id = result.memory_id.unwrap();
    assert_eq!(result.category, Some(MemoryCategory::CodeSolution));
    assert_eq!(
        result.tags.as_deref(),
        Some(&["algorithm".to_string(), "binary-search".to_string()][..])
    );

    let entry = h.store.get_memory_by_id(id).unwrap().expect("memory exists");
    assert_eq!(entry.content, "Use a binary search to locate the split point");
    assert_eq!(entry.category, MemoryCategory::CodeSolution);
    assert_eq!(entry.tags, vec!["algorithm", "binary-search"]);
    assert_eq!(entry.access_count, 0);
    assert!(entry.created_at <= entry.updated_at);
    assert_eq!(entry.content_hash.len(), 64);
}

#[test]
fn long_content_preview_is_truncated() {
    let h = harness();
    let content = "word ".repeat(60);
    let result = h.store_one(&content, "learning", &[]);
    let preview = result.content_preview.unwrap();
    assert!(preview.ends_with("..."));
    assert_eq!(preview.chars().count(), 103);
}

#[test]
fn duplicate_content_soft_fails_with_existing_id() {
    let h = harness();
    let first = h.store_one("The cache must be invalidated on write", "learning", &[]);
    assert!(first.success);
    let original_id = first.memory_id.unwrap();

    // Same content after sanitization: surrounding whitespace is trimmed.
    let second = h.store_one("  The cache must be invalidated on write  ", "learning", &[]);
    assert!(!second.success);
    assert_eq!(second.memory_id, Some(original_id));
    assert_eq!(second.message.as_deref(), Some("Memory already exists"));

    // Nothing was inserted the second time.
    assert_eq!(h.store.get_stats().unwrap().total_memories, 1);
}

#[test]
fn category_aliases_and_unknowns_normalize() {
    let h = harness();
    let aliased = h.store_one("Reduce allocation churn in the hot loop", "perf", &[]);
    assert_eq!(aliased.category, Some(MemoryCategory::Performance));

    let unknown = h.store_one("Completely uncategorizable note", "zzz", &[]);
    assert_eq!(unknown.category, Some(MemoryCategory::Other));
}

#[test]
fn capacity_limit_soft_fails_without_inserting() {
    let h = harness_with_limit(2);
    assert!(h.store_one("first memory entry", "learning", &[]).success);
    assert!(h.store_one("second memory entry", "learning", &[]).success);

    let third = h.store_one("third memory entry", "learning", &[]);
    assert!(!third.success);
    assert!(third.message.unwrap().contains("Memory limit reached"));
    assert_eq!(third.memory_id, None);
    assert_eq!(h.store.get_stats().unwrap().total_memories, 2);

    // Still full on retry.
    let again = h.store_one("fourth memory entry", "learning", &[]);
    assert!(!again.success);
}

#[test]
fn invalid_input_is_rejected_before_any_write() {
    let h = harness();
    let empty = h
        .store
        .store_memory(&h.encoder, &h.classifier, "   ", "learning", &[]);
    assert!(empty.is_err());

    let bad_tags = h.store.store_memory(
        &h.encoder,
        &h.classifier,
        "valid content",
        "learning",
        &["has space".to_string()],
    );
    assert!(bad_tags.is_err());
    assert_eq!(h.store.get_stats().unwrap().total_memories, 0);
}

#[test]
fn delete_removes_both_rows() {
    let h = harness();
    let id = h
        .store_one("Ephemeral note scheduled for deletion", "learning", &[])
        .memory_id
        .unwrap();

    assert!(h.store.delete_memory(id).unwrap());
    assert!(h.store.get_memory_by_id(id).unwrap().is_none());
    // Vector row is gone too: the memory no longer matches any search.
    let (results, total) = h
        .store
        .search_memories(&h.encoder, "ephemeral note", 10, None, 0, None)
        .unwrap();
    assert!(results.is_empty());
    assert_eq!(total, 0);

    // Deleting again reports not-found.
    assert!(!h.store.delete_memory(id).unwrap());
}

#[test]
fn recent_memories_returns_latest() {
    let h = harness();
    let contents = [
        "first stored note",
        "second stored note",
        "third stored note",
    ];
    for content in contents {
        assert!(h.store_one(content, "learning", &[]).success);
    }

    let recent = h.store.get_recent_memories(10).unwrap();
    assert_eq!(recent.len(), 3);
    let got: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
    for content in contents {
        assert!(got.contains(&content));
    }

    // Limit is clamped, not rejected.
    assert_eq!(h.store.get_recent_memories(0).unwrap().len(), 1);
    assert!(h.store.get_recent_memories(10_000).unwrap().len() <= 50);
}

#[test]
fn cleanup_with_no_old_memories_is_a_noop() {
    let h = harness();
    h.store_one("fresh memory, not a cleanup candidate", "learning", &[]);

    let result = h.store.clear_old_memories(30, 1000).unwrap();
    assert!(result.success);
    assert_eq!(result.deleted_count, 0);
    assert_eq!(result.remaining_count, 1);
    assert_eq!(result.message, "No memories need to be deleted");
}

#[test]
fn cleanup_rejects_out_of_bounds_params() {
    let h = harness();
    assert!(h.store.clear_old_memories(0, 100).is_err());
    assert!(h.store.clear_old_memories(30, 0).is_err());
}

#[test]
fn stats_report_counts_categories_and_health() {
    let h = harness();
    h.store_one("Reduce allocation churn in the hot loop", "performance", &[]);
    h.store_one("Validate all user input at the boundary", "security", &[]);
    h.store_one("Second security note about input handling", "security", &[]);

    let stats = h.store.get_stats().unwrap();
    assert_eq!(stats.total_memories, 3);
    assert_eq!(stats.recent_week_count, 3);
    assert_eq!(stats.health_status, HealthStatus::Healthy);
    assert_eq!(stats.embedding_model, engram_core::constants::EMBEDDING_MODEL);
    assert_eq!(
        stats.embedding_dimensions,
        engram_core::constants::EMBEDDING_DIM
    );
    // Categories descending by count: security (2) first.
    assert_eq!(stats.categories[0], ("security".to_string(), 2));
    assert!(stats.top_accessed.len() <= 5);
    // In-memory database has no file size.
    assert_eq!(stats.database_size_mb, 0.0);
}

#[test]
fn tag_projections_and_idf_monotonicity() {
    let h = harness();
    // "shared-tag" appears in two memories, "rare-tag" in one.
    h.store_one("first note carrying the shared tag", "learning", &["shared-tag"]);
    h.store_one(
        "second note carrying shared and rare tags",
        "learning",
        &["shared-tag", "rare-tag"],
    );

    let unique = h.store.get_unique_tags().unwrap();
    assert_eq!(unique, vec!["rare-tag", "shared-tag"]);

    let canonical = h.store.get_canonical_tags().unwrap();
    assert_eq!(canonical, vec!["rare-tag", "shared-tag"]);

    let frequencies = h.store.get_tag_frequencies().unwrap();
    assert_eq!(frequencies[0], ("shared-tag".to_string(), 2));
    assert_eq!(frequencies[1], ("rare-tag".to_string(), 1));

    // IDF: lower frequency => strictly higher weight.
    let weights = h.store.get_tag_weights().unwrap();
    assert!(weights["rare-tag"] > weights["shared-tag"]);
    let expected = 1.0 / (1.0f64 + 2.0).ln();
    assert!((weights["shared-tag"] - expected).abs() < 1e-9);
}

#[test]
fn version_tags_never_collapse() {
    let h = harness();
    h.store_one("Notes about the first API revision", "learning", &["api-v1"]);
    h.store_one("Notes about the second API revision", "learning", &["api-v2"]);

    let canonical = h.store.get_canonical_tags().unwrap();
    assert!(canonical.contains(&"api-v1".to_string()));
    assert!(canonical.contains(&"api-v2".to_string()));
}

#[test]
fn encoder_is_shared_through_the_async_service() {
    use engram_storage::MemoryService;
    use std::sync::Arc;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();

    runtime.block_on(async {
        let mut config = EngramConfig::default();
        config.storage.memory_limit = 100;
        let store = MemoryStore::open_in_memory(config.clone()).unwrap();
        let encoder: Arc<dyn TextEncoder> =
            Arc::new(EmbeddingEngine::with_fallback(&config.embedding).unwrap());
        let service = MemoryService::with_encoder(store, encoder);

        // Concurrent first calls share one lazy initialization.
        let (a, b) = tokio::join!(
            service.store_memory("concurrent store one", "learning", &[]),
            service.store_memory("concurrent store two", "learning", &[]),
        );
        assert!(a.unwrap().success);
        assert!(b.unwrap().success);

        let (results, total) = service
            .search_memories("concurrent store", 10, None, 0, None)
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(results.len(), 2);

        let stats = service.get_stats().await.unwrap();
        assert_eq!(stats.total_memories, 2);
    });
}
