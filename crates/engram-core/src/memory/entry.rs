use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::CONTENT_PREVIEW_LENGTH;

use super::category::MemoryCategory;

/// A stored memory. The embedding lives in a parallel vector table keyed
/// by `id`; a vector row exists iff the metadata row exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Monotonically-increasing rowid.
    pub id: i64,
    /// blake3 hex digest of the NFC-normalized, trimmed content. Unique.
    pub content_hash: String,
    /// The memory text, sanitized at the boundary.
    pub content: String,
    /// One of the closed canonical set.
    pub category: MemoryCategory,
    /// Canonical tags, insertion order preserved, no duplicates.
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped once per search that returns this memory.
    pub access_count: u32,
}

impl MemoryEntry {
    /// First 100 characters of content, with a trailing ellipsis when
    /// truncated.
    pub fn content_preview(&self) -> String {
        preview(&self.content)
    }
}

/// Truncate to the preview length on a character boundary.
pub fn preview(content: &str) -> String {
    if content.chars().count() > CONTENT_PREVIEW_LENGTH {
        let truncated: String = content.chars().take(CONTENT_PREVIEW_LENGTH).collect();
        format!("{truncated}...")
    } else {
        content.to_string()
    }
}
