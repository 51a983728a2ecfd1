//! Storage-specific error types.

use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database operation failed (sqlx error).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error (e.g., filesystem failure while preparing the database).
    #[error("internal error: {0}")]
    Internal(String),
}
