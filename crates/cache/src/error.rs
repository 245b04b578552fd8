//! Cache store error types.

use thiserror::Error;

/// Cache store operation errors.
///
/// Absence is never an error here: missing boards and rows are `Option`s or
/// sentinel entries, and a primary-key collision on insert is the typed
/// [`InsertOutcome::Conflict`](crate::models::InsertOutcome::Conflict).
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend could not be reached or a connection could not be acquired.
    #[error("connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// The backend rejected a statement or returned something undecodable.
    #[error("query error: {0}")]
    Query(#[source] sqlx::Error),

    #[error("invalid name: {0}")]
    InvalidName(#[from] ladder_core::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    /// Whether the error means the backend is unreachable rather than the
    /// statement being wrong.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<sqlx::Error> for CacheError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_) => Self::Connection(err),
            other => Self::Query(other),
        }
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;
