//! # Directory Indexer
//!
//! Listing ingestion for the business directory: validates and normalizes
//! provider payloads, geocodes addresses, persists batches atomically and keeps
//! the search mirror in step with the relational store.
//!
//! ## Architecture
//!
//! The indexer follows a Processor-Orchestrator-Loader pattern:
//!
//! 1. **Processor**: Validates and normalizes listings, fills coordinates
//! 2. **Orchestrator**: Persists batches and captures leads
//! 3. **Reindex**: Background worker that schedules mirror rebuilds
//! 4. **Loader**: Rebuilds the search mirror from the relational store
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`geocoder`]: Address to coordinate lookups
//! - [`processor`]: Listing validation and normalization
//! - [`orchestrator`]: Ingestion and lead capture
//! - [`reindex`]: Coalescing background reindex worker
//! - [`loader`]: Full mirror rebuilds
//! - [`errors`]: Error types for the indexer

pub mod config;
pub mod errors;
pub mod geocoder;
pub mod loader;
pub mod orchestrator;
pub mod processor;
pub mod reindex;

pub use config::Dependencies;
pub use errors::{ErrorKind, IngestError};
pub use loader::{IndexMirrorBuilder, ReindexReport};
pub use orchestrator::{IngestOutcome, IngestService};
pub use reindex::{ReindexConfig, ReindexHandle, ReindexWorker};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
