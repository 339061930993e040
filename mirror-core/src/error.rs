//! Error types for mirror-core

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// A resource pointer segment contained the path separator
    #[error("Invalid segment: {0}")]
    InvalidSegment(String),

    /// A policy (or one of its resource entries) is structurally invalid
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    /// An operation required an identifier that was not present
    #[error("Missing identifier: {0}")]
    MissingIdentifier(String),

    /// JSON parsing error (serde_json)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid segment error
    pub fn invalid_segment(msg: impl Into<String>) -> Self {
        Error::InvalidSegment(msg.into())
    }

    /// Create an invalid policy error
    pub fn invalid_policy(msg: impl Into<String>) -> Self {
        Error::InvalidPolicy(msg.into())
    }

    /// Create a missing identifier error
    pub fn missing_identifier(msg: impl Into<String>) -> Self {
        Error::MissingIdentifier(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}
