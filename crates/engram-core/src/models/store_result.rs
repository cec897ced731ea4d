use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::memory::{entry, MemoryCategory};

/// Outcome of `store_memory`. Duplicate content and a full store are soft
/// failures: `success` is false and `message` says why, but no error is
/// raised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreResult {
    pub success: bool,
    /// Present on success, and on duplicate (the pre-existing id).
    pub memory_id: Option<i64>,
    pub message: Option<String>,
    pub content_preview: Option<String>,
    pub category: Option<MemoryCategory>,
    pub tags: Option<Vec<String>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl StoreResult {
    pub fn stored(
        memory_id: i64,
        content: &str,
        category: MemoryCategory,
        tags: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            success: true,
            memory_id: Some(memory_id),
            message: None,
            content_preview: Some(entry::preview(content)),
            category: Some(category),
            tags: Some(tags),
            created_at: Some(created_at),
        }
    }

    pub fn duplicate(existing_id: i64) -> Self {
        Self {
            success: false,
            memory_id: Some(existing_id),
            message: Some("Memory already exists".to_string()),
            content_preview: None,
            category: None,
            tags: None,
            created_at: None,
        }
    }

    pub fn limit_reached(count: usize, limit: usize) -> Self {
        Self {
            success: false,
            memory_id: None,
            message: Some(format!(
                "Memory limit reached ({count}/{limit}). Use clear_old_memories to free space."
            )),
            content_preview: None,
            category: None,
            tags: None,
            created_at: None,
        }
    }
}
