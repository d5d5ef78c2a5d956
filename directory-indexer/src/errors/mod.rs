//! Error types for listing ingestion, geocoding and reindexing.

use directory_repository::RepositoryError;
use search_index_repository::SearchIndexError;
use serde::Serialize;
use thiserror::Error;

/// Broad class of an ingestion failure, for programmatic handling by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// The request payload was rejected; nothing was written.
    Validation,
    /// The relational store failed; the batch was rolled back.
    Persistence,
    /// The search engine failed.
    Downstream,
}

/// Errors that can occur while ingesting listings, capturing leads or
/// rebuilding the search mirror.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Malformed payload.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from the relational store.
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    /// Error from the search index.
    #[error("Search index error: {0}")]
    SearchIndexError(String),
}

impl IngestError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a persistence error.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::PersistenceError(msg.into())
    }

    /// Create a search index error.
    pub fn search_index(msg: impl Into<String>) -> Self {
        Self::SearchIndexError(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationError(_) => ErrorKind::Validation,
            Self::PersistenceError(_) => ErrorKind::Persistence,
            Self::SearchIndexError(_) => ErrorKind::Downstream,
        }
    }
}

impl From<RepositoryError> for IngestError {
    fn from(err: RepositoryError) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl From<SearchIndexError> for IngestError {
    fn from(err: SearchIndexError) -> Self {
        if err.is_validation() {
            Self::ValidationError(err.to_string())
        } else {
            Self::SearchIndexError(err.to_string())
        }
    }
}

/// Errors from a geocoding lookup. Callers treat all of them as "no coordinates".
#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("Geocoding credential is not configured")]
    MissingCredential,

    #[error("Geocoding request failed: {0}")]
    Transport(String),

    #[error("Geocoding service returned status {0}")]
    HttpStatus(u16),

    #[error("Invalid geocoding response: {0}")]
    Parse(String),

    #[error("No geocoding result for query")]
    NoMatch,
}

impl From<reqwest::Error> for GeocodeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
