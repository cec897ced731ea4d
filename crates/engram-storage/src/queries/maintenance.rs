//! Cleanup candidates and stats aggregates.

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection};

use engram_core::models::TopAccessed;
use engram_core::EngramResult;

use crate::to_storage_err;

/// Memories older than the cutoff, least-valuable first
/// (`access_count ASC, created_at ASC`).
pub fn cleanup_candidates(
    conn: &Connection,
    cutoff: DateTime<Utc>,
) -> EngramResult<Vec<i64>> {
    let mut stmt = conn
        .prepare(
            "SELECT id FROM memory_metadata
             WHERE created_at < ?1
             ORDER BY access_count ASC, created_at ASC",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![cutoff.to_rfc3339()], |row| row.get::<_, i64>(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))
}

/// Delete metadata and vector rows for the given ids. Caller owns the
/// transaction.
pub fn delete_memories(conn: &Connection, ids: &[i64]) -> EngramResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let placeholders = vec!["?"; ids.len()].join(",");
    conn.execute(
        &format!("DELETE FROM memory_metadata WHERE id IN ({placeholders})"),
        params_from_iter(ids.iter()),
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    conn.execute(
        &format!("DELETE FROM memory_vectors WHERE id IN ({placeholders})"),
        params_from_iter(ids.iter()),
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Per-category counts, descending.
pub fn category_counts(conn: &Connection) -> EngramResult<Vec<(String, usize)>> {
    let mut stmt = conn
        .prepare(
            "SELECT category, COUNT(*) FROM memory_metadata
             GROUP BY category ORDER BY COUNT(*) DESC",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))
}

/// Memories created after the given instant.
pub fn count_created_since(
    conn: &Connection,
    since: DateTime<Utc>,
) -> EngramResult<usize> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM memory_metadata WHERE created_at > ?1",
            params![since.to_rfc3339()],
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(count as usize)
}

/// Top-N memories by access count, with content previews.
pub fn top_accessed(conn: &Connection, limit: usize) -> EngramResult<Vec<TopAccessed>> {
    let mut stmt = conn
        .prepare(
            "SELECT content, access_count FROM memory_metadata
             ORDER BY access_count DESC LIMIT ?1",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![limit as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u32))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut top = Vec::new();
    for row in rows {
        let (content, access_count) = row.map_err(|e| to_storage_err(e.to_string()))?;
        top.push(TopAccessed {
            content_preview: engram_core::memory::entry::preview(&content),
            access_count,
        });
    }
    Ok(top)
}
