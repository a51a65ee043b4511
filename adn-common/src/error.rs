//! Common error types for ADN services

use thiserror::Error;

/// Common result type for ADN operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across ADN services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization of a stored field failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or empty submission
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Update would break a job invariant (terminal state left, progress
    /// decreased, log history rewritten)
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
