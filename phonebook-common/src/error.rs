//! Common error types for the phonebook

use thiserror::Error;

/// Common result type for phonebook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the repository, the parser and the server
#[derive(Error, Debug)]
pub enum Error {
    /// Requested contact does not exist
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation on single create or patch
    #[error("{0}")]
    Conflict(String),

    /// Malformed request body or unparseable upload
    #[error("{0}")]
    BadInput(String),

    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The message used when a contact id does not resolve
    pub fn contact_not_found() -> Self {
        Error::NotFound("Cannot find contact".to_string())
    }
}
