//! Error types for mirror-search-index

use thiserror::Error;

/// Result type alias using our SearchIndexError
pub type Result<T> = std::result::Result<T, SearchIndexError>;

/// Search-index projection errors
#[derive(Error, Debug)]
pub enum SearchIndexError {
    /// Error from mirror-core (invalid segment, missing identifier, ...)
    #[error("Core error: {0}")]
    Core(#[from] mirror_core::Error),

    /// A removal filter did not compile to a valid pattern
    #[error("Bad removal filter: {0}")]
    BadFilter(String),
}

impl SearchIndexError {
    /// Create a missing identifier error
    pub fn missing_identifier(msg: impl Into<String>) -> Self {
        SearchIndexError::Core(mirror_core::Error::missing_identifier(msg))
    }

    /// Create a bad filter error
    pub fn bad_filter(msg: impl Into<String>) -> Self {
        SearchIndexError::BadFilter(msg.into())
    }
}
