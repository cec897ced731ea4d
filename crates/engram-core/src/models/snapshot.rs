use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted tag snapshot. `snapshot_id` is a pure function of the
/// captured `(memory_id, sorted tags)` sequence, so snapshots of identical
/// state collide into a single row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub snapshot_id: String,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub memory_count: usize,
    /// `(memory_id, tags)` in ascending id order, tags in stored order.
    pub entries: Vec<(i64, Vec<String>)>,
}

/// Outcome of `snapshot_create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResult {
    pub success: bool,
    /// First 16 hex chars of the state digest.
    pub snapshot_id: String,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub memory_count: usize,
}

/// Outcome of `snapshot_restore`. A missing snapshot is a soft failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreResult {
    pub success: bool,
    pub restored_count: usize,
    pub error: Option<String>,
}

impl RestoreResult {
    pub fn restored(count: usize) -> Self {
        Self {
            success: true,
            restored_count: count,
            error: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            success: false,
            restored_count: 0,
            error: Some("snapshot not found".to_string()),
        }
    }
}
