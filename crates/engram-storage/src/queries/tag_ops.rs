//! Canonical tag store: content-addressed vocabulary with embeddings and
//! access frequencies driving IDF weights.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use engram_core::EngramResult;

use crate::to_storage_err;

use super::{bytes_to_f32_vec, f32_vec_to_bytes};

/// Load all canonical tags with embeddings, in insertion (rowid) order.
/// Order matters: merge ties keep the first candidate encountered.
pub fn load_canonical(conn: &Connection) -> EngramResult<Vec<(String, Vec<f32>)>> {
    let mut stmt = conn
        .prepare("SELECT tag, embedding FROM canonical_tags ORDER BY rowid")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            let tag: String = row.get(0)?;
            let blob: Vec<u8> = row.get(1)?;
            Ok((tag, blob))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut entries = Vec::new();
    for row in rows {
        let (tag, blob) = row.map_err(|e| to_storage_err(e.to_string()))?;
        entries.push((tag, bytes_to_f32_vec(&blob)));
    }
    Ok(entries)
}

/// Insert a canonical tag with frequency 1. No-op if it already exists.
pub fn insert_canonical(
    conn: &Connection,
    tag: &str,
    embedding: &[f32],
    now: DateTime<Utc>,
) -> EngramResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO canonical_tags (tag, embedding, frequency, created_at)
         VALUES (?1, ?2, 1, ?3)",
        params![tag, f32_vec_to_bytes(embedding), now.to_rfc3339()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Increment a canonical tag's access frequency.
pub fn increment_frequency(conn: &Connection, tag: &str) -> EngramResult<()> {
    conn.execute(
        "UPDATE canonical_tags SET frequency = frequency + 1 WHERE tag = ?1",
        params![tag],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// All canonical tags, sorted alphabetically.
pub fn canonical_tags_sorted(conn: &Connection) -> EngramResult<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT tag FROM canonical_tags ORDER BY tag")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))
}

/// Tag frequencies, descending.
pub fn tag_frequencies(conn: &Connection) -> EngramResult<Vec<(String, u64)>> {
    let mut stmt = conn
        .prepare("SELECT tag, frequency FROM canonical_tags ORDER BY frequency DESC, tag")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))
}

/// IDF weights: `1 / ln(1 + frequency)`. Common tags shrink, rare tags
/// grow.
pub fn tag_weights(conn: &Connection) -> EngramResult<BTreeMap<String, f64>> {
    let mut weights = BTreeMap::new();
    for (tag, frequency) in tag_frequencies(conn)? {
        weights.insert(tag, 1.0 / (1.0 + frequency as f64).ln());
    }
    Ok(weights)
}

/// Recompute every canonical tag's frequency from the memories that
/// actually carry it (floored at 1). Used by normalize-apply so
/// frequencies reflect the rewritten tag arrays.
pub fn recompute_frequencies(conn: &Connection) -> EngramResult<()> {
    conn.execute(
        "UPDATE canonical_tags
         SET frequency = MAX(1, (
             SELECT COUNT(*)
             FROM memory_metadata m, json_each(m.tags) je
             WHERE je.value = canonical_tags.tag
         ))",
        [],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Distinct tags across all memories, sorted. Rows with unparsable tag
/// JSON are skipped.
pub fn unique_memory_tags(conn: &Connection) -> EngramResult<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT tags FROM memory_metadata")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut unique = std::collections::BTreeSet::new();
    for row in rows {
        let tags_json = row.map_err(|e| to_storage_err(e.to_string()))?;
        if let Ok(tags) = serde_json::from_str::<Vec<String>>(&tags_json) {
            unique.extend(tags);
        }
    }
    Ok(unique.into_iter().collect())
}
