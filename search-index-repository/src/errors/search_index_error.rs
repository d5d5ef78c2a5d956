//! Search index error types.
//!
//! This module defines the unified error type for all search index operations,
//! including both low-level backend errors and high-level application errors.

use thiserror::Error;

/// Unified errors from search index operations.
///
/// Used by the `SearchIndexProvider` trait and `SearchIndexService` for all search index
/// operations. Includes both low-level backend errors (connection, serialization, etc.)
/// and high-level application errors (validation, configuration).
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// Validation error (e.g., out-of-range query parameters).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Missing or malformed connection settings.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Failed to reach the search engine.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to retrieve or create the collection.
    #[error("Collection error: {0}")]
    CollectionError(String),

    /// Bulk import request failed as a whole.
    #[error("Import error: {0}")]
    ImportError(String),

    /// Search request failed.
    #[error("Search error: {0}")]
    SearchError(String),

    /// Failed to parse response from the search engine.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the search engine.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Unknown error.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl SearchIndexError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a collection error.
    pub fn collection(msg: impl Into<String>) -> Self {
        Self::CollectionError(msg.into())
    }

    /// Create an import error.
    pub fn import(msg: impl Into<String>) -> Self {
        Self::ImportError(msg.into())
    }

    /// Create a search error.
    pub fn search(msg: impl Into<String>) -> Self {
        Self::SearchError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create an unknown error.
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    /// True for errors caused by the caller's input rather than the backend.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_))
    }
}

impl From<reqwest::Error> for SearchIndexError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::parse(e.to_string())
        } else {
            Self::connection(e.to_string())
        }
    }
}
