//! Insert, get, delete, and listing queries for memories.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use engram_core::{EngramResult, MemoryCategory, MemoryEntry};

use crate::to_storage_err;

use super::f32_vec_to_bytes;

const ENTRY_COLUMNS: &str =
    "id, content_hash, content, category, tags, created_at, updated_at, access_count";

/// Insert a memory's metadata and vector rows. Caller owns the
/// transaction. Returns the new rowid.
pub fn insert_memory(
    conn: &Connection,
    content_hash: &str,
    content: &str,
    category: MemoryCategory,
    tags: &[String],
    embedding: &[f32],
    now: DateTime<Utc>,
) -> EngramResult<i64> {
    let tags_json = serde_json::to_string(tags)?;
    let now_str = now.to_rfc3339();

    conn.execute(
        "INSERT INTO memory_metadata (content_hash, content, category, tags, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![content_hash, content, category.as_str(), tags_json, now_str, now_str],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    let memory_id = conn.last_insert_rowid();

    conn.execute(
        "INSERT INTO memory_vectors (id, embedding) VALUES (?1, ?2)",
        params![memory_id, f32_vec_to_bytes(embedding)],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(memory_id)
}

/// Look up a memory id by content hash.
pub fn find_by_hash(conn: &Connection, content_hash: &str) -> EngramResult<Option<i64>> {
    conn.query_row(
        "SELECT id FROM memory_metadata WHERE content_hash = ?1",
        params![content_hash],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Total memory count.
pub fn count_memories(conn: &Connection) -> EngramResult<usize> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM memory_metadata", [], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(count as usize)
}

/// Get a single memory by id.
pub fn get_memory(conn: &Connection, id: i64) -> EngramResult<Option<MemoryEntry>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM memory_metadata WHERE id = ?1"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let result = stmt
        .query_row(params![id], |row| Ok(row_to_entry(row)))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    result.transpose()
}

/// Latest memories by creation time.
pub fn recent_memories(conn: &Connection, limit: usize) -> EngramResult<Vec<MemoryEntry>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM memory_metadata ORDER BY created_at DESC LIMIT ?1"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![limit as i64], |row| Ok(row_to_entry(row)))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut memories = Vec::new();
    for row in rows {
        memories.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(memories)
}

/// Delete a memory's metadata and vector rows. Caller owns the
/// transaction. Returns false when the id does not exist.
pub fn delete_memory(conn: &Connection, id: i64) -> EngramResult<bool> {
    let deleted = conn
        .execute("DELETE FROM memory_metadata WHERE id = ?1", params![id])
        .map_err(|e| to_storage_err(e.to_string()))?;
    conn.execute("DELETE FROM memory_vectors WHERE id = ?1", params![id])
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(deleted > 0)
}

/// Parse a metadata row into a `MemoryEntry`.
pub(crate) fn row_to_entry(row: &rusqlite::Row<'_>) -> EngramResult<MemoryEntry> {
    let category_str: String = row.get(3).map_err(|e| to_storage_err(e.to_string()))?;
    let tags_json: String = row.get(4).map_err(|e| to_storage_err(e.to_string()))?;
    let created_str: String = row.get(5).map_err(|e| to_storage_err(e.to_string()))?;
    let updated_str: String = row.get(6).map_err(|e| to_storage_err(e.to_string()))?;

    let category = MemoryCategory::parse(&category_str)
        .ok_or_else(|| to_storage_err(format!("unknown category in row: '{category_str}'")))?;
    let tags: Vec<String> = serde_json::from_str(&tags_json)
        .map_err(|e| to_storage_err(format!("parse tags: {e}")))?;

    let parse_dt = |s: &str| -> EngramResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| to_storage_err(format!("parse datetime '{s}': {e}")))
    };

    Ok(MemoryEntry {
        id: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
        content_hash: row.get(1).map_err(|e| to_storage_err(e.to_string()))?,
        content: row.get(2).map_err(|e| to_storage_err(e.to_string()))?,
        category,
        tags,
        created_at: parse_dt(&created_str)?,
        updated_at: parse_dt(&updated_str)?,
        access_count: row
            .get::<_, i64>(7)
            .map_err(|e| to_storage_err(e.to_string()))? as u32,
    })
}
