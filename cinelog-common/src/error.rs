//! Common error types for cinelog

use thiserror::Error;

/// Common result type for cinelog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across cinelog crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog file could not be read or written
    #[error("Catalog file error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cloud copy of the catalog could not be updated
    #[error("Sync error: {0}")]
    Sync(String),

    /// Batch or search state stored with a session could not be encoded or decoded
    #[error("Session state error: {0}")]
    SessionState(String),
}
