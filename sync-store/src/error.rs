//! Error types for sync-store.

use std::path::PathBuf;

/// Storage layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored JSON column could not be read or written.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failure injected by a test double.
    #[error("injected failure: {0}")]
    Injected(String),

    /// Database path error.
    #[error("invalid database path: {path}")]
    InvalidPath {
        /// The invalid path.
        path: PathBuf,
    },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
