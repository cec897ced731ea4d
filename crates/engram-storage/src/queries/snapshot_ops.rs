//! Tag snapshots: deterministic state digests, persistence, and restore
//! primitives.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use engram_core::models::SnapshotRecord;
use engram_core::EngramResult;

use crate::to_storage_err;

/// Every memory's `(id, tags)` in ascending id order, tags in stored
/// order.
pub fn read_tag_state(conn: &Connection) -> EngramResult<Vec<(i64, Vec<String>)>> {
    let mut stmt = conn
        .prepare("SELECT id, tags FROM memory_metadata ORDER BY id")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut state = Vec::new();
    for row in rows {
        let (id, tags_json) = row.map_err(|e| to_storage_err(e.to_string()))?;
        let tags: Vec<String> = serde_json::from_str(&tags_json)
            .map_err(|e| to_storage_err(format!("parse tags for memory {id}: {e}")))?;
        state.push((id, tags));
    }
    Ok(state)
}

/// Deterministic 16-hex snapshot id: a streaming blake3 over
/// `(memory_id, sorted tags)` lines in ascending id order. Identical
/// state always digests to the identical id.
pub fn snapshot_digest(state: &[(i64, Vec<String>)]) -> EngramResult<String> {
    let mut hasher = blake3::Hasher::new();
    for (id, tags) in state {
        let mut sorted = tags.clone();
        sorted.sort();
        let line = format!("{id}:{}\n", serde_json::to_string(&sorted)?);
        hasher.update(line.as_bytes());
    }
    Ok(hasher.finalize().to_hex()[..16].to_string())
}

/// Persist a snapshot. Re-inserting an existing id is a no-op: the id is
/// a pure function of the captured state, so the stored payload is
/// already identical.
pub fn insert_snapshot(
    conn: &Connection,
    snapshot_id: &str,
    label: &str,
    created_at: DateTime<Utc>,
    state: &[(i64, Vec<String>)],
) -> EngramResult<()> {
    let payload = serde_json::to_vec(state)?;
    conn.execute(
        "INSERT OR IGNORE INTO tag_snapshots (snapshot_id, label, created_at, memory_count, payload)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            snapshot_id,
            label,
            created_at.to_rfc3339(),
            state.len() as i64,
            payload
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Load a snapshot by id.
pub fn get_snapshot(
    conn: &Connection,
    snapshot_id: &str,
) -> EngramResult<Option<SnapshotRecord>> {
    let row = conn
        .query_row(
            "SELECT snapshot_id, label, created_at, memory_count, payload
             FROM tag_snapshots WHERE snapshot_id = ?1",
            params![snapshot_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Vec<u8>>(4)?,
                ))
            },
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    let Some((snapshot_id, label, created_str, memory_count, payload)) = row else {
        return Ok(None);
    };

    let created_at = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| to_storage_err(format!("parse snapshot created_at: {e}")))?;
    let entries: Vec<(i64, Vec<String>)> = serde_json::from_slice(&payload)?;

    Ok(Some(SnapshotRecord {
        snapshot_id,
        label,
        created_at,
        memory_count: memory_count as usize,
        entries,
    }))
}

/// Overwrite one memory's tag array. Returns the number of rows matched
/// (0 when the memory no longer exists).
pub fn update_tags(conn: &Connection, memory_id: i64, tags: &[String]) -> EngramResult<usize> {
    let tags_json = serde_json::to_string(tags)?;
    let updated = conn
        .execute(
            "UPDATE memory_metadata SET tags = ?2 WHERE id = ?1",
            params![memory_id, tags_json],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic_and_16_hex() {
        let state = vec![
            (1, vec!["b".to_string(), "a".to_string()]),
            (2, vec!["c".to_string()]),
        ];
        let d1 = snapshot_digest(&state).unwrap();
        let d2 = snapshot_digest(&state).unwrap();
        assert_eq!(d1, d2);
        assert_eq!(d1.len(), 16);
        assert!(d1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn digest_ignores_tag_order_within_a_memory() {
        let a = vec![(1, vec!["x".to_string(), "y".to_string()])];
        let b = vec![(1, vec!["y".to_string(), "x".to_string()])];
        assert_eq!(snapshot_digest(&a).unwrap(), snapshot_digest(&b).unwrap());
    }

    #[test]
    fn digest_is_sensitive_to_any_tag_change() {
        let a = vec![(1, vec!["x".to_string()])];
        let b = vec![(1, vec!["z".to_string()])];
        assert_ne!(snapshot_digest(&a).unwrap(), snapshot_digest(&b).unwrap());
    }

    #[test]
    fn digest_is_sensitive_to_memory_ids() {
        let a = vec![(1, vec!["x".to_string()])];
        let b = vec![(2, vec!["x".to_string()])];
        assert_ne!(snapshot_digest(&a).unwrap(), snapshot_digest(&b).unwrap());
    }
}
