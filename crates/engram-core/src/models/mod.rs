mod cleanup_result;
mod memory_stats;
mod normalize;
mod search_result;
mod snapshot;
mod store_result;

pub use cleanup_result::CleanupResult;
pub use memory_stats::{HealthStatus, MemoryStats, TopAccessed};
pub use normalize::{ApplyResult, PreviewResult, TagChange};
pub use search_result::SearchResult;
pub use snapshot::{RestoreResult, SnapshotRecord, SnapshotResult};
pub use store_result::StoreResult;
