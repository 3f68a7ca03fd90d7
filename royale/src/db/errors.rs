//! Credential store error types.

use std::time::Duration;
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique constraint violated (username already taken)
    #[error("Duplicate record")]
    Duplicate,

    /// Operation exceeded the caller-supplied timeout
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Store unreachable (pool exhausted, connection refused, closed)
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    /// Whether the caller may legitimately retry the operation
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Timeout(_) | StoreError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::Duplicate,
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StoreError::Unavailable(err.to_string()),
            other => StoreError::Database(other),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
