use serde::{Deserialize, Serialize};

/// One planned remapping: a memory whose tags would change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagChange {
    pub memory_id: i64,
    pub old_tags: Vec<String>,
    pub new_tags: Vec<String>,
}

/// Outcome of `tag_normalize_preview`. Non-destructive; `preview_id` is a
/// pure function of database state, threshold, and model identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResult {
    pub success: bool,
    pub preview_id: String,
    pub total_memories_scanned: usize,
    pub unique_tags_before: usize,
    pub unique_tags_after: usize,
    /// Individual tag replacements across all planned changes.
    pub planned_updates_count: usize,
    /// Memories whose tag list would change.
    pub affected_memories_count: usize,
    /// First few planned changes, as a sample.
    pub changes: Vec<TagChange>,
    pub threshold: f32,
}

/// Outcome of `tag_normalize_apply`. Missing snapshot and plan drift are
/// soft failures; neither leaves partial writes behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResult {
    pub success: bool,
    pub applied_count: usize,
    pub memories_updated: usize,
    pub snapshot_id: String,
    pub preview_id: String,
    pub error: Option<String>,
}

impl ApplyResult {
    pub fn applied(
        applied_count: usize,
        memories_updated: usize,
        snapshot_id: String,
        preview_id: String,
    ) -> Self {
        Self {
            success: true,
            applied_count,
            memories_updated,
            snapshot_id,
            preview_id,
            error: None,
        }
    }

    pub fn snapshot_not_found(snapshot_id: String, preview_id: String) -> Self {
        Self {
            success: false,
            applied_count: 0,
            memories_updated: 0,
            snapshot_id,
            preview_id,
            error: Some("snapshot not found".to_string()),
        }
    }

    pub fn preview_mismatch(snapshot_id: String, preview_id: String) -> Self {
        Self {
            success: false,
            applied_count: 0,
            memories_updated: 0,
            snapshot_id,
            preview_id,
            error: Some("preview mismatch".to_string()),
        }
    }
}
