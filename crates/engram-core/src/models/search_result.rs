use serde::{Deserialize, Serialize};

use crate::memory::MemoryEntry;

/// One search hit. `distance` is cosine distance; `similarity = 1 - distance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub memory: MemoryEntry,
    pub similarity: f32,
    pub distance: f32,
}
