/// Engram system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding model identifier.
pub const EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";

/// Embedding dimensionality (`D`). Vectors on disk are `D` little-endian f32s.
pub const EMBEDDING_DIM: usize = 384;

/// Hard cap on stored memories; `store_memory` soft-fails at this count.
pub const MAX_TOTAL_MEMORIES: usize = 10_000;

/// Upper bound for search/recent limits.
pub const MAX_MEMORIES_PER_SEARCH: usize = 50;

/// Maximum pagination offset accepted by search.
pub const MAX_SEARCH_OFFSET: usize = 10_000;

/// Maximum memory content length in characters.
pub const MAX_CONTENT_LENGTH: usize = 10_000;

/// Maximum search query length in characters.
pub const MAX_QUERY_LENGTH: usize = 1_000;

/// Maximum number of tags per memory.
pub const MAX_TAGS_PER_MEMORY: usize = 10;

/// Maximum length of a single tag.
pub const MAX_TAG_LENGTH: usize = 50;

/// Default cosine-similarity threshold for merging two tags.
pub const TAG_SIMILARITY_THRESHOLD: f32 = 0.85;

/// Lower threshold used when both tags carry the same version.
pub const TAG_RELATED_THRESHOLD: f32 = 0.75;

/// Similarity floor for merging tags whose numeric tokens differ.
pub const TAG_NUMBER_GUARD_THRESHOLD: f32 = 0.95;

/// Minimum word length eligible for the substring boost.
pub const TAG_SUBSTRING_MIN_LENGTH: usize = 4;

/// Boost added to similarity when one tag's words are a strict subset of
/// the other's (capped at 1.0).
pub const TAG_SUBSTRING_BOOST: f32 = 0.05;

/// Words excluded from the substring boost.
pub const TAG_SUBSTRING_STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "this", "that", "code", "data", "test",
];

/// Minimum similarity for semantic category classification.
pub const CATEGORY_SIMILARITY_THRESHOLD: f32 = 0.50;

/// Required margin over the `other` category score.
pub const CATEGORY_MIN_MARGIN: f32 = 0.05;

/// Number of planned changes included in a preview response sample.
pub const PREVIEW_SAMPLE_LIMIT: usize = 20;

/// Content preview length used in store results and stats.
pub const CONTENT_PREVIEW_LENGTH: usize = 100;
