/// Storage-layer errors for SQLite operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed: {reason}")]
    MigrationFailed { reason: String },

    #[error("invalid database path: {reason}")]
    InvalidPath { reason: String },
}
