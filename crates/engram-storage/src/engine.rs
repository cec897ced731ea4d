//! MemoryStore — owns the connection pool and implements the full
//! operation surface: store/search/recent/stats/delete/cleanup, the
//! canonical tag projections, and the snapshot / preview / apply /
//! restore workflow.
//!
//! Every multi-statement operation runs in a single transaction on the
//! write connection; a failure mid-transaction rolls back entirely.

use chrono::{Duration, Utc};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use engram_core::config::EngramConfig;
use engram_core::constants::{
    MAX_CONTENT_LENGTH, MAX_MEMORIES_PER_SEARCH, PREVIEW_SAMPLE_LIMIT,
};
use engram_core::models::{
    ApplyResult, CleanupResult, HealthStatus, MemoryStats, PreviewResult, RestoreResult,
    SearchResult, SnapshotResult, StoreResult,
};
use engram_core::traits::TextEncoder;
use engram_core::{validation, EngramResult, MemoryEntry};
use engram_tags::{CategoryClassifier, TagNormalizer, TagVocabulary};

use crate::normalize::{self, NormalizePlan};
use crate::pool::ConnectionPool;
use crate::queries::{maintenance, memory_crud, memory_search, snapshot_ops, tag_ops};
use crate::{migrations, to_storage_err};

/// The main storage engine. Owns the connection pool and provides the
/// full memory operation surface.
pub struct MemoryStore {
    pool: ConnectionPool,
    config: EngramConfig,
}

impl MemoryStore {
    /// Open a store backed by a file on disk.
    pub fn open(config: EngramConfig) -> EngramResult<Self> {
        validation::validate_db_path(&config.storage.db_path)?;
        let pool = ConnectionPool::open(&config.storage.db_path, config.storage.read_pool_size)?;
        let store = Self { pool, config };
        store.initialize()?;
        Ok(store)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory(config: EngramConfig) -> EngramResult<Self> {
        let pool = ConnectionPool::open_in_memory()?;
        let store = Self { pool, config };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> EngramResult<()> {
        self.pool.with_writer(|conn| {
            migrations::run_migrations(conn)?;
            Ok(())
        })?;
        info!(
            path = ?self.pool.db_path(),
            limit = self.config.storage.memory_limit,
            "memory store opened"
        );
        Ok(())
    }

    pub fn config(&self) -> &EngramConfig {
        &self.config
    }

    /// Execute a read-only query.
    fn with_reader<F, T>(&self, f: F) -> EngramResult<T>
    where
        F: FnOnce(&Connection) -> EngramResult<T>,
    {
        self.pool.with_reader(f)
    }

    /// Run a closure inside a single transaction on the write connection.
    fn in_write_tx<F, T>(&self, name: &str, f: F) -> EngramResult<T>
    where
        F: FnOnce(&Connection) -> EngramResult<T>,
    {
        self.pool.with_writer(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| to_storage_err(format!("{name} begin: {e}")))?;
            match f(&tx) {
                Ok(value) => {
                    tx.commit()
                        .map_err(|e| to_storage_err(format!("{name} commit: {e}")))?;
                    Ok(value)
                }
                Err(e) => {
                    let _ = tx.rollback();
                    Err(e)
                }
            }
        })
    }

    /// Store a new memory: sanitize, classify the category, normalize the
    /// tags against the canonical store, embed, and insert metadata +
    /// vector atomically. Duplicates and a full store are soft failures.
    pub fn store_memory(
        &self,
        encoder: &dyn TextEncoder,
        classifier: &CategoryClassifier,
        content: &str,
        category: &str,
        tags: &[String],
    ) -> EngramResult<StoreResult> {
        let content = validation::sanitize_input(content, MAX_CONTENT_LENGTH)?;
        let tags = validation::validate_tags(tags)?;
        let category = classifier.classify(category, encoder)?;
        let content_hash = validation::generate_content_hash(&content);
        let memory_limit = self.config.storage.memory_limit;
        let merge_config = self.config.tags.clone();

        self.in_write_tx("store_memory", |conn| {
            if let Some(existing_id) = memory_crud::find_by_hash(conn, &content_hash)? {
                debug!(memory_id = existing_id, "duplicate content hash");
                return Ok(StoreResult::duplicate(existing_id));
            }

            let count = memory_crud::count_memories(conn)?;
            if count >= memory_limit {
                warn!(count, memory_limit, "memory limit reached");
                return Ok(StoreResult::limit_reached(count, memory_limit));
            }

            let now = Utc::now();

            // Normalize tags inside the transaction so the canonical
            // store and the memory row move together.
            let vocab = TagVocabulary::from_entries(tag_ops::load_canonical(conn)?);
            let mut normalizer = TagNormalizer::new(vocab, encoder, merge_config);
            let outcome = normalizer.normalize(&tags)?;
            let vocab = normalizer.into_vocabulary();
            for tag in &outcome.created {
                let embedding = vocab
                    .embedding(tag)
                    .ok_or_else(|| to_storage_err(format!("missing embedding for '{tag}'")))?;
                tag_ops::insert_canonical(conn, tag, embedding, now)?;
            }
            for tag in &outcome.adopted {
                tag_ops::increment_frequency(conn, tag)?;
            }

            let embedding = encoder.encode_single(&content)?;
            let memory_id = memory_crud::insert_memory(
                conn,
                &content_hash,
                &content,
                category,
                &outcome.tags,
                &embedding,
                now,
            )?;

            info!(memory_id, category = %category, "stored memory");
            Ok(StoreResult::stored(
                memory_id,
                &content,
                category,
                outcome.tags,
                now,
            ))
        })
    }

    /// k-NN search by cosine distance with optional category/tag filters.
    /// Returns the requested page and the total count matching the
    /// filters. Access counters of returned rows are bumped in the same
    /// transaction.
    pub fn search_memories(
        &self,
        encoder: &dyn TextEncoder,
        query: &str,
        limit: usize,
        category: Option<&str>,
        offset: usize,
        tags: Option<&[String]>,
    ) -> EngramResult<(Vec<SearchResult>, usize)> {
        let (query, limit, category) = validation::validate_search_params(query, limit, category)?;
        let offset = validation::validate_search_offset(offset)?;
        let tags = validation::validate_search_tags(tags)?;

        let query_embedding = encoder.encode_single(&query)?;

        self.in_write_tx("search_memories", |conn| {
            let filters = memory_search::SearchFilters {
                category,
                tags: tags.as_deref(),
            };
            memory_search::search(
                conn,
                &query_embedding,
                limit,
                offset,
                &filters,
                Utc::now(),
            )
        })
    }

    /// Latest memories by creation time. The limit is clamped, not
    /// rejected.
    pub fn get_recent_memories(&self, limit: usize) -> EngramResult<Vec<MemoryEntry>> {
        let limit = limit.clamp(1, MAX_MEMORIES_PER_SEARCH);
        self.with_reader(|conn| memory_crud::recent_memories(conn, limit))
    }

    pub fn get_memory_by_id(&self, id: i64) -> EngramResult<Option<MemoryEntry>> {
        self.with_reader(|conn| memory_crud::get_memory(conn, id))
    }

    /// Delete a memory and its vector. Returns false when the id does not
    /// exist.
    pub fn delete_memory(&self, id: i64) -> EngramResult<bool> {
        self.in_write_tx("delete_memory", |conn| memory_crud::delete_memory(conn, id))
    }

    /// Delete old, rarely-accessed memories down to `max_to_keep`.
    /// Candidates are memories older than `days_old`, least accessed and
    /// oldest first.
    pub fn clear_old_memories(
        &self,
        days_old: u32,
        max_to_keep: usize,
    ) -> EngramResult<CleanupResult> {
        let (days_old, max_to_keep) = validation::validate_cleanup_params(days_old, max_to_keep)?;
        let cutoff = Utc::now() - Duration::days(days_old as i64);

        self.in_write_tx("clear_old_memories", |conn| {
            let candidates = maintenance::cleanup_candidates(conn, cutoff)?;
            let total = memory_crud::count_memories(conn)?;

            let to_delete = candidates
                .len()
                .min(total.saturating_sub(max_to_keep));
            if to_delete == 0 {
                return Ok(CleanupResult::nothing_to_delete(total));
            }

            maintenance::delete_memories(conn, &candidates[..to_delete])?;
            info!(deleted = to_delete, remaining = total - to_delete, "cleared old memories");
            Ok(CleanupResult::deleted(to_delete, total - to_delete))
        })
    }

    /// Aggregate statistics and a capacity health label.
    pub fn get_stats(&self) -> EngramResult<MemoryStats> {
        let db_size = self
            .pool
            .db_path()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);
        let memory_limit = self.config.storage.memory_limit;

        self.with_reader(|conn| {
            let total = memory_crud::count_memories(conn)?;
            let week_ago = Utc::now() - Duration::days(7);

            Ok(MemoryStats {
                total_memories: total,
                memory_limit,
                categories: maintenance::category_counts(conn)?,
                recent_week_count: maintenance::count_created_since(conn, week_ago)?,
                database_size_mb: (db_size as f64 / 1024.0 / 1024.0 * 100.0).round() / 100.0,
                embedding_model: self.config.embedding.model.clone(),
                embedding_dimensions: self.config.embedding.dimensions,
                top_accessed: maintenance::top_accessed(conn, 5)?,
                health_status: HealthStatus::from_usage(total, memory_limit),
            })
        })
    }

    /// Distinct tags across all memories, sorted.
    pub fn get_unique_tags(&self) -> EngramResult<Vec<String>> {
        self.with_reader(tag_ops::unique_memory_tags)
    }

    /// All canonical tags, sorted.
    pub fn get_canonical_tags(&self) -> EngramResult<Vec<String>> {
        self.with_reader(tag_ops::canonical_tags_sorted)
    }

    /// Canonical tag frequencies, descending.
    pub fn get_tag_frequencies(&self) -> EngramResult<Vec<(String, u64)>> {
        self.with_reader(tag_ops::tag_frequencies)
    }

    /// IDF weights per canonical tag.
    pub fn get_tag_weights(&self) -> EngramResult<std::collections::BTreeMap<String, f64>> {
        self.with_reader(tag_ops::tag_weights)
    }

    /// Freeze every memory's tags under a deterministic snapshot id.
    /// Snapshotting identical state twice yields the identical id and a
    /// single persisted row.
    pub fn snapshot_create(&self, label: &str) -> EngramResult<SnapshotResult> {
        let label = validation::sanitize_input(label, 200)?;

        self.in_write_tx("snapshot_create", |conn| {
            let state = snapshot_ops::read_tag_state(conn)?;
            let snapshot_id = snapshot_ops::snapshot_digest(&state)?;
            let created_at = Utc::now();
            snapshot_ops::insert_snapshot(conn, &snapshot_id, &label, created_at, &state)?;

            info!(snapshot_id = %snapshot_id, memories = state.len(), "snapshot created");
            Ok(SnapshotResult {
                success: true,
                snapshot_id,
                label,
                created_at,
                memory_count: state.len(),
            })
        })
    }

    /// Rewrite every captured memory's tags from the snapshot payload.
    /// Memories created after the snapshot are left as-is.
    pub fn snapshot_restore(&self, snapshot_id: &str) -> EngramResult<RestoreResult> {
        self.in_write_tx("snapshot_restore", |conn| {
            let Some(snapshot) = snapshot_ops::get_snapshot(conn, snapshot_id)? else {
                return Ok(RestoreResult::not_found());
            };

            let mut restored = 0;
            for (memory_id, tags) in &snapshot.entries {
                restored += snapshot_ops::update_tags(conn, *memory_id, tags)?;
            }

            info!(snapshot_id = %snapshot_id, restored, "snapshot restored");
            Ok(RestoreResult::restored(restored))
        })
    }

    /// Dry-run the re-normalization of every memory's tags. No writes.
    pub fn tag_normalize_preview(
        &self,
        encoder: &dyn TextEncoder,
        threshold: Option<f32>,
    ) -> EngramResult<PreviewResult> {
        let config = self.merge_config_with(threshold);
        let model_name = self.config.embedding.model.clone();

        let plan =
            self.with_reader(|conn| normalize::compute_plan(conn, encoder, config, &model_name))?;

        Ok(preview_result_from_plan(plan))
    }

    /// Apply a previously previewed plan, gated on a persisted snapshot
    /// and an exact preview-id match. The plan is recomputed inside the
    /// write transaction, so concurrent writes between preview and apply
    /// surface as a mismatch instead of being overwritten.
    pub fn tag_normalize_apply(
        &self,
        encoder: &dyn TextEncoder,
        preview_id: &str,
        snapshot_id: &str,
        threshold: Option<f32>,
    ) -> EngramResult<ApplyResult> {
        let config = self.merge_config_with(threshold);
        let model_name = self.config.embedding.model.clone();

        self.in_write_tx("tag_normalize_apply", |conn| {
            if snapshot_ops::get_snapshot(conn, snapshot_id)?.is_none() {
                return Ok(ApplyResult::snapshot_not_found(
                    snapshot_id.to_string(),
                    preview_id.to_string(),
                ));
            }

            let plan = normalize::compute_plan(conn, encoder, config, &model_name)?;

            // An empty plan trivially succeeds: there is nothing the
            // caller's preview could disagree with.
            if plan.changes.is_empty() {
                return Ok(ApplyResult::applied(
                    0,
                    0,
                    snapshot_id.to_string(),
                    preview_id.to_string(),
                ));
            }

            if plan.preview_id != preview_id {
                warn!(
                    expected = %plan.preview_id,
                    provided = %preview_id,
                    "normalize plan changed since preview"
                );
                return Ok(ApplyResult::preview_mismatch(
                    snapshot_id.to_string(),
                    preview_id.to_string(),
                ));
            }

            let now = Utc::now();
            for (tag, embedding) in &plan.new_canonical {
                tag_ops::insert_canonical(conn, tag, embedding, now)?;
            }
            let mut memories_updated = 0;
            for change in &plan.changes {
                memories_updated +=
                    snapshot_ops::update_tags(conn, change.memory_id, &change.new_tags)?;
            }
            tag_ops::recompute_frequencies(conn)?;

            info!(
                applied = plan.changes.len(),
                memories_updated, "normalize plan applied"
            );
            Ok(ApplyResult::applied(
                plan.changes.len(),
                memories_updated,
                snapshot_id.to_string(),
                preview_id.to_string(),
            ))
        })
    }

    fn merge_config_with(&self, threshold: Option<f32>) -> engram_core::config::MergeConfig {
        match threshold {
            Some(t) => self.config.tags.clone().with_similarity_threshold(t),
            None => self.config.tags.clone(),
        }
    }
}

fn preview_result_from_plan(plan: NormalizePlan) -> PreviewResult {
    let affected = plan.changes.len();
    let mut changes = plan.changes;
    changes.truncate(PREVIEW_SAMPLE_LIMIT);

    PreviewResult {
        success: true,
        preview_id: plan.preview_id,
        total_memories_scanned: plan.total_memories_scanned,
        unique_tags_before: plan.unique_tags_before,
        unique_tags_after: plan.unique_tags_after,
        planned_updates_count: plan.planned_updates_count,
        affected_memories_count: affected,
        changes,
        threshold: plan.threshold,
    }
}
