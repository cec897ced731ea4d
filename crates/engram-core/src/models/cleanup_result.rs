use serde::{Deserialize, Serialize};

/// Outcome of `clear_old_memories`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupResult {
    pub success: bool,
    pub deleted_count: usize,
    pub remaining_count: usize,
    pub message: String,
}

impl CleanupResult {
    pub fn nothing_to_delete(total: usize) -> Self {
        Self {
            success: true,
            deleted_count: 0,
            remaining_count: total,
            message: "No memories need to be deleted".to_string(),
        }
    }

    pub fn deleted(count: usize, remaining: usize) -> Self {
        Self {
            success: true,
            deleted_count: count,
            remaining_count: remaining,
            message: format!("Deleted {count} old memories"),
        }
    }
}
