//! # Search Index Repository
//!
//! This crate provides traits and implementations for the search mirror of the
//! directory. It includes definitions for errors, interfaces, the query
//! compiler, a concrete implementation for Typesense and an in-memory provider.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod query;
pub mod service;
pub mod types;
pub mod typesense;

pub use config::SearchIndexServiceConfig;
pub use errors::SearchIndexError;
pub use interfaces::SearchIndexProvider;
pub use memory::InMemorySearchProvider;
pub use query::compile;
pub use service::SearchIndexService;
pub use types::{BatchOperationResult, BatchOperationSummary, SearchRequest, SortField};
pub use typesense::{TypesenseConfig, TypesenseProvider};
