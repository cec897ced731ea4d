//! # engram-tags
//!
//! The tag/category normalization engine:
//! - pure string analysis (versions, numbers, `key:value` structure)
//! - the merge predicate that decides when two tags may collapse
//! - the semantic normalization planner over a canonical vocabulary
//! - the hybrid exact / alias / embedding category classifier
//!
//! Everything here is side-effect free; persistence lives in
//! `engram-storage`.

pub mod analyzer;
pub mod classifier;
pub mod merge;
pub mod normalizer;

pub use classifier::CategoryClassifier;
pub use merge::can_merge;
pub use normalizer::{NormalizeOutcome, TagNormalizer, TagVocabulary};
