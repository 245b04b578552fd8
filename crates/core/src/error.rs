//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid board name: {0}")]
    InvalidBoardName(String),

    #[error("invalid table prefix: {0}")]
    InvalidTablePrefix(String),

    #[error("unknown time window: {0}")]
    UnknownWindow(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
