//! Async facade over `MemoryStore`.
//!
//! One concurrency model: cooperative callers, blocking work dispatched
//! to the runtime's blocking pool. The embedding provider (and the
//! category classifier derived from it) is constructed lazily, at most
//! once — concurrent callers share the single in-flight initialization.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::OnceCell;

use engram_core::models::{
    ApplyResult, CleanupResult, MemoryStats, PreviewResult, RestoreResult, SearchResult,
    SnapshotResult, StoreResult,
};
use engram_core::traits::TextEncoder;
use engram_core::{EngramError, EngramResult, MemoryEntry};
use engram_tags::CategoryClassifier;

use crate::engine::MemoryStore;

/// Produces the embedding provider on first use. Runs on the blocking
/// pool, so model loading may be arbitrarily slow.
pub type EncoderFactory =
    dyn Fn() -> EngramResult<Arc<dyn TextEncoder>> + Send + Sync + 'static;

/// Provider plus the classifier built from it, initialized together.
struct EncoderContext {
    encoder: Arc<dyn TextEncoder>,
    classifier: CategoryClassifier,
}

/// The public, task-safe operation surface.
pub struct MemoryService {
    store: Arc<MemoryStore>,
    factory: Arc<EncoderFactory>,
    context: OnceCell<Arc<EncoderContext>>,
}

impl MemoryService {
    /// Service with a lazily-invoked encoder factory.
    pub fn new(
        store: MemoryStore,
        factory: impl Fn() -> EngramResult<Arc<dyn TextEncoder>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            store: Arc::new(store),
            factory: Arc::new(factory),
            context: OnceCell::new(),
        }
    }

    /// Service around an already-constructed encoder.
    pub fn with_encoder(store: MemoryStore, encoder: Arc<dyn TextEncoder>) -> Self {
        Self::new(store, move || Ok(Arc::clone(&encoder)))
    }

    /// Direct access to the synchronous engine.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Lazy, at-most-once construction of encoder + classifier. All
    /// concurrent callers await the same in-flight initialization.
    async fn context(&self) -> EngramResult<Arc<EncoderContext>> {
        self.context
            .get_or_try_init(|| async {
                let factory = Arc::clone(&self.factory);
                tokio::task::spawn_blocking(move || {
                    let encoder = factory()?;
                    let classifier = CategoryClassifier::new(encoder.as_ref())?;
                    Ok(Arc::new(EncoderContext {
                        encoder,
                        classifier,
                    }))
                })
                .await
                .map_err(join_error)?
            })
            .await
            .cloned()
    }

    pub async fn store_memory(
        &self,
        content: &str,
        category: &str,
        tags: &[String],
    ) -> EngramResult<StoreResult> {
        let context = self.context().await?;
        let store = Arc::clone(&self.store);
        let content = content.to_string();
        let category = category.to_string();
        let tags = tags.to_vec();
        tokio::task::spawn_blocking(move || {
            store.store_memory(
                context.encoder.as_ref(),
                &context.classifier,
                &content,
                &category,
                &tags,
            )
        })
        .await
        .map_err(join_error)?
    }

    pub async fn search_memories(
        &self,
        query: &str,
        limit: usize,
        category: Option<&str>,
        offset: usize,
        tags: Option<&[String]>,
    ) -> EngramResult<(Vec<SearchResult>, usize)> {
        let context = self.context().await?;
        let store = Arc::clone(&self.store);
        let query = query.to_string();
        let category = category.map(|c| c.to_string());
        let tags = tags.map(|t| t.to_vec());
        tokio::task::spawn_blocking(move || {
            store.search_memories(
                context.encoder.as_ref(),
                &query,
                limit,
                category.as_deref(),
                offset,
                tags.as_deref(),
            )
        })
        .await
        .map_err(join_error)?
    }

    pub async fn get_recent_memories(&self, limit: usize) -> EngramResult<Vec<MemoryEntry>> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.get_recent_memories(limit))
            .await
            .map_err(join_error)?
    }

    pub async fn get_memory_by_id(&self, id: i64) -> EngramResult<Option<MemoryEntry>> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.get_memory_by_id(id))
            .await
            .map_err(join_error)?
    }

    pub async fn delete_memory(&self, id: i64) -> EngramResult<bool> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.delete_memory(id))
            .await
            .map_err(join_error)?
    }

    pub async fn clear_old_memories(
        &self,
        days_old: u32,
        max_to_keep: usize,
    ) -> EngramResult<CleanupResult> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.clear_old_memories(days_old, max_to_keep))
            .await
            .map_err(join_error)?
    }

    pub async fn get_stats(&self) -> EngramResult<MemoryStats> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.get_stats())
            .await
            .map_err(join_error)?
    }

    pub async fn get_unique_tags(&self) -> EngramResult<Vec<String>> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.get_unique_tags())
            .await
            .map_err(join_error)?
    }

    pub async fn get_canonical_tags(&self) -> EngramResult<Vec<String>> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.get_canonical_tags())
            .await
            .map_err(join_error)?
    }

    pub async fn get_tag_frequencies(&self) -> EngramResult<Vec<(String, u64)>> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.get_tag_frequencies())
            .await
            .map_err(join_error)?
    }

    pub async fn get_tag_weights(&self) -> EngramResult<BTreeMap<String, f64>> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.get_tag_weights())
            .await
            .map_err(join_error)?
    }

    pub async fn snapshot_create(&self, label: &str) -> EngramResult<SnapshotResult> {
        let store = Arc::clone(&self.store);
        let label = label.to_string();
        tokio::task::spawn_blocking(move || store.snapshot_create(&label))
            .await
            .map_err(join_error)?
    }

    pub async fn snapshot_restore(&self, snapshot_id: &str) -> EngramResult<RestoreResult> {
        let store = Arc::clone(&self.store);
        let snapshot_id = snapshot_id.to_string();
        tokio::task::spawn_blocking(move || store.snapshot_restore(&snapshot_id))
            .await
            .map_err(join_error)?
    }

    pub async fn tag_normalize_preview(
        &self,
        threshold: Option<f32>,
    ) -> EngramResult<PreviewResult> {
        let context = self.context().await?;
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            store.tag_normalize_preview(context.encoder.as_ref(), threshold)
        })
        .await
        .map_err(join_error)?
    }

    pub async fn tag_normalize_apply(
        &self,
        preview_id: &str,
        snapshot_id: &str,
        threshold: Option<f32>,
    ) -> EngramResult<ApplyResult> {
        let context = self.context().await?;
        let store = Arc::clone(&self.store);
        let preview_id = preview_id.to_string();
        let snapshot_id = snapshot_id.to_string();
        tokio::task::spawn_blocking(move || {
            store.tag_normalize_apply(
                context.encoder.as_ref(),
                &preview_id,
                &snapshot_id,
                threshold,
            )
        })
        .await
        .map_err(join_error)?
    }
}

fn join_error(e: tokio::task::JoinError) -> EngramError {
    EngramError::Internal(format!("blocking task failed: {e}"))
}
