//! SQLite connections: one serialized writer plus read-only connections
//! for file-backed stores.
//!
//! The writer is the transaction boundary for every mutating operation.
//! File-backed stores also get a set of WAL readers so queries are not
//! queued behind writes. In-memory stores have no separate readers (each
//! in-memory connection would be its own database), so reads fall
//! through to the writer.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};

use engram_core::EngramResult;

use crate::to_storage_err;

/// All connections of one store.
pub struct ConnectionPool {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    cursor: AtomicUsize,
    db_path: Option<PathBuf>,
}

impl ConnectionPool {
    /// Open the writer and `reader_count` read-only connections (at
    /// least one) for the given database file.
    pub fn open(path: &Path, reader_count: usize) -> EngramResult<Self> {
        let writer = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        configure_writer(&writer)?;

        let reader_count = reader_count.max(1);
        let mut readers = Vec::with_capacity(reader_count);
        for _ in 0..reader_count {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
            configure_reader(&conn)?;
            readers.push(Mutex::new(conn));
        }

        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            cursor: AtomicUsize::new(0),
            db_path: Some(path.to_path_buf()),
        })
    }

    /// In-memory pool (for testing). No reader set: all access goes
    /// through the writer.
    pub fn open_in_memory() -> EngramResult<Self> {
        let writer = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        configure_writer(&writer)?;
        Ok(Self {
            writer: Mutex::new(writer),
            readers: Vec::new(),
            cursor: AtomicUsize::new(0),
            db_path: None,
        })
    }

    /// The backing file, if any.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Run a closure on the write connection. Mutations are serialized
    /// here.
    pub fn with_writer<F, T>(&self, f: F) -> EngramResult<T>
    where
        F: FnOnce(&Connection) -> EngramResult<T>,
    {
        let conn = self
            .writer
            .lock()
            .map_err(|e| to_storage_err(format!("writer lock poisoned: {e}")))?;
        f(&conn)
    }

    /// Run a read-only closure. Readers rotate; a pool without readers
    /// reads through the writer.
    pub fn with_reader<F, T>(&self, f: F) -> EngramResult<T>
    where
        F: FnOnce(&Connection) -> EngramResult<T>,
    {
        if self.readers.is_empty() {
            return self.with_writer(f);
        }
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[slot]
            .lock()
            .map_err(|e| to_storage_err(format!("reader lock poisoned: {e}")))?;
        f(&conn)
    }
}

/// Writer setup: WAL so readers never block behind writes, relaxed
/// fsync, enforced foreign keys, and a busy timeout covering external
/// connections to the same file.
fn configure_writer(conn: &Connection) -> EngramResult<()> {
    conn.busy_timeout(Duration::from_secs(10))
        .map_err(|e| to_storage_err(e.to_string()))?;
    // journal_mode reports the resulting mode as a row; in-memory
    // databases answer "memory" instead of "wal".
    conn.pragma_update_and_check(None, "journal_mode", "wal", |_row| Ok(()))
        .map_err(|e| to_storage_err(e.to_string()))?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .map_err(|e| to_storage_err(e.to_string()))?;
    conn.pragma_update(None, "foreign_keys", true)
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

fn configure_reader(conn: &Connection) -> EngramResult<()> {
    conn.busy_timeout(Duration::from_secs(10))
        .map_err(|e| to_storage_err(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_reads_fall_through_to_the_writer() {
        let pool = ConnectionPool::open_in_memory().unwrap();
        pool.with_writer(|conn| {
            conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (7)")
                .map_err(|e| to_storage_err(e.to_string()))
        })
        .unwrap();

        let x: i64 = pool
            .with_reader(|conn| {
                conn.query_row("SELECT x FROM t", [], |row| row.get(0))
                    .map_err(|e| to_storage_err(e.to_string()))
            })
            .unwrap();
        assert_eq!(x, 7);
    }

    #[test]
    fn file_backed_readers_see_committed_writes() {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(&dir.path().join("pool.db"), 2).unwrap();

        pool.with_writer(|conn| {
            conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (1), (2)")
                .map_err(|e| to_storage_err(e.to_string()))
        })
        .unwrap();

        // Successive reads rotate through the reader set.
        for _ in 0..3 {
            let count: i64 = pool
                .with_reader(|conn| {
                    conn.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
                        .map_err(|e| to_storage_err(e.to_string()))
                })
                .unwrap();
            assert_eq!(count, 2);
        }
        assert!(pool.db_path().is_some());
    }
}
