//! Schema creation and backward-compatible column backfill.

use rusqlite::Connection;

use engram_core::errors::StorageError;
use engram_core::EngramResult;

/// Create all tables and indexes, idempotently, and backfill the
/// `frequency` column on canonical_tags for databases created before it
/// existed.
pub fn run_migrations(conn: &Connection) -> EngramResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS memory_metadata (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            content_hash TEXT UNIQUE NOT NULL,
            content      TEXT NOT NULL,
            category     TEXT NOT NULL,
            tags         TEXT NOT NULL,  -- JSON array, insertion order
            created_at   TEXT NOT NULL,
            updated_at   TEXT NOT NULL,
            access_count INTEGER DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS memory_vectors (
            id        INTEGER PRIMARY KEY,
            embedding BLOB NOT NULL  -- D little-endian f32s
        );

        CREATE TABLE IF NOT EXISTS canonical_tags (
            tag        TEXT PRIMARY KEY,
            embedding  BLOB NOT NULL,
            frequency  INTEGER DEFAULT 1,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tag_snapshots (
            snapshot_id  TEXT PRIMARY KEY,
            label        TEXT NOT NULL,
            created_at   TEXT NOT NULL,
            memory_count INTEGER NOT NULL,
            payload      BLOB NOT NULL  -- serialized (memory_id, tags) list
        );

        CREATE INDEX IF NOT EXISTS idx_category ON memory_metadata(category);
        CREATE INDEX IF NOT EXISTS idx_created_at ON memory_metadata(created_at);
        CREATE INDEX IF NOT EXISTS idx_hash ON memory_metadata(content_hash);
        CREATE INDEX IF NOT EXISTS idx_access_count ON memory_metadata(access_count);
        ",
    )
    .map_err(|e| {
        engram_core::EngramError::Storage(StorageError::MigrationFailed {
            reason: e.to_string(),
        })
    })?;

    backfill_frequency_column(conn)?;
    Ok(())
}

/// Older databases lack `canonical_tags.frequency`; add it with default 1.
fn backfill_frequency_column(conn: &Connection) -> EngramResult<()> {
    match conn.execute_batch("ALTER TABLE canonical_tags ADD COLUMN frequency INTEGER DEFAULT 1") {
        Ok(()) => Ok(()),
        // Column already exists on every database this code created.
        Err(e) if e.to_string().contains("duplicate column name") => Ok(()),
        Err(e) => Err(engram_core::EngramError::Storage(
            StorageError::MigrationFailed {
                reason: e.to_string(),
            },
        )),
    }
}
