//! Error types for record collection operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    /// A stored row could not be mapped back to a record.
    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: i64, reason: String },

    /// A previous writer panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,

    #[error("unsupported schema version {found} (supported up to {supported})")]
    UnsupportedSchema { found: i64, supported: i64 },

    #[error("I/O error at {path}: {message}")]
    Io { path: PathBuf, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}
