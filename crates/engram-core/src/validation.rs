//! Boundary validation: sanitization, bounds checks, content hashing.
//!
//! Everything here rejects with `EngramError::InvalidInput` before any
//! transaction begins.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::constants::{
    MAX_MEMORIES_PER_SEARCH, MAX_QUERY_LENGTH, MAX_SEARCH_OFFSET, MAX_TAGS_PER_MEMORY,
    MAX_TAG_LENGTH, MAX_TOTAL_MEMORIES,
};
use crate::errors::{EngramError, EngramResult};
use crate::memory::MemoryCategory;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9:_-]+$").expect("tag charset regex"));

/// Strip control characters (keeping tab and newline), trim, and bound the
/// length. Rejects input that is empty after trimming.
pub fn sanitize_input(input: &str, max_len: usize) -> EngramResult<String> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_control() || *c == '\t' || *c == '\n')
        .collect();
    let trimmed = cleaned.trim();

    if trimmed.is_empty() {
        return Err(EngramError::invalid_input("input is empty"));
    }
    let char_count = trimmed.chars().count();
    if char_count > max_len {
        return Err(EngramError::invalid_input(format!(
            "input too long: {char_count} chars (max {max_len})"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate and lowercase a tag list: bounded count, bounded length,
/// `[a-z0-9:_-]+` charset, no duplicates. Order is preserved.
pub fn validate_tags(tags: &[String]) -> EngramResult<Vec<String>> {
    if tags.len() > MAX_TAGS_PER_MEMORY {
        return Err(EngramError::invalid_input(format!(
            "too many tags: {} (max {MAX_TAGS_PER_MEMORY})",
            tags.len()
        )));
    }

    let mut validated = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            return Err(EngramError::invalid_input("empty tag"));
        }
        if tag.chars().count() > MAX_TAG_LENGTH {
            return Err(EngramError::invalid_input(format!(
                "tag too long: '{tag}' (max {MAX_TAG_LENGTH} chars)"
            )));
        }
        if !TAG_RE.is_match(&tag) {
            return Err(EngramError::invalid_input(format!(
                "tag '{tag}' contains invalid characters (allowed: a-z 0-9 : _ -)"
            )));
        }
        if validated.contains(&tag) {
            return Err(EngramError::invalid_input(format!("duplicate tag: '{tag}'")));
        }
        validated.push(tag);
    }
    Ok(validated)
}

/// A search category filter must name a canonical category exactly.
pub fn validate_category(category: Option<&str>) -> EngramResult<Option<MemoryCategory>> {
    match category {
        None => Ok(None),
        Some(raw) => {
            let lowered = raw.trim().to_lowercase();
            MemoryCategory::parse(&lowered)
                .map(Some)
                .ok_or_else(|| EngramError::invalid_input(format!("unknown category: '{raw}'")))
        }
    }
}

/// Validate the (query, limit, category) triple for search.
pub fn validate_search_params(
    query: &str,
    limit: usize,
    category: Option<&str>,
) -> EngramResult<(String, usize, Option<MemoryCategory>)> {
    let query = sanitize_input(query, MAX_QUERY_LENGTH)?;
    if limit == 0 || limit > MAX_MEMORIES_PER_SEARCH {
        return Err(EngramError::invalid_input(format!(
            "limit must be between 1 and {MAX_MEMORIES_PER_SEARCH}"
        )));
    }
    let category = validate_category(category)?;
    Ok((query, limit, category))
}

/// Pagination offset bound.
pub fn validate_search_offset(offset: usize) -> EngramResult<usize> {
    if offset > MAX_SEARCH_OFFSET {
        return Err(EngramError::invalid_input(format!(
            "offset must not exceed {MAX_SEARCH_OFFSET}"
        )));
    }
    Ok(offset)
}

/// Sanitize an optional tag filter. Tags are lowercased so they can match
/// stored (always-lowercase) tags; an empty list means no filter.
pub fn validate_search_tags(tags: Option<&[String]>) -> EngramResult<Option<Vec<String>>> {
    let Some(tags) = tags else { return Ok(None) };
    let mut sanitized = Vec::with_capacity(tags.len());
    for tag in tags {
        if tag.trim().is_empty() {
            continue;
        }
        sanitized.push(sanitize_input(tag, MAX_TAG_LENGTH)?.to_lowercase());
    }
    if sanitized.is_empty() {
        Ok(None)
    } else {
        Ok(Some(sanitized))
    }
}

/// Bounds for `clear_old_memories`.
pub fn validate_cleanup_params(days_old: u32, max_to_keep: usize) -> EngramResult<(u32, usize)> {
    if days_old == 0 || days_old > 3650 {
        return Err(EngramError::invalid_input(
            "days_old must be between 1 and 3650",
        ));
    }
    if max_to_keep == 0 || max_to_keep > MAX_TOTAL_MEMORIES {
        return Err(EngramError::invalid_input(format!(
            "max_to_keep must be between 1 and {MAX_TOTAL_MEMORIES}"
        )));
    }
    Ok((days_old, max_to_keep))
}

/// blake3 hex digest over the NFC-normalized, trimmed content. Used for
/// duplicate detection.
pub fn generate_content_hash(content: &str) -> String {
    let normalized: String = content.trim().nfc().collect();
    blake3::hash(normalized.as_bytes()).to_hex().to_string()
}

/// Ensure a database path is usable: creatable parent directory, not a
/// directory, not a symlink.
pub fn validate_db_path(path: &Path) -> EngramResult<()> {
    use crate::errors::StorageError;

    if path.as_os_str().is_empty() {
        return Err(StorageError::InvalidPath {
            reason: "empty path".to_string(),
        }
        .into());
    }
    if path.is_dir() {
        return Err(StorageError::InvalidPath {
            reason: format!("'{}' is a directory", path.display()),
        }
        .into());
    }
    if path.is_symlink() {
        return Err(StorageError::InvalidPath {
            reason: format!("'{}' is a symlink", path.display()),
        }
        .into());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::InvalidPath {
                reason: format!("cannot create '{}': {e}", parent.display()),
            })?;
        }
    }
    Ok(())
}
