//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (Typesense, in-memory).

use async_trait::async_trait;
use directory_shared::{ListingDocument, SearchResponse};

use crate::errors::SearchIndexError;
use crate::types::{BatchOperationSummary, SearchRequest};

/// Abstracts the underlying search engine.
///
/// Implementations are injected into `SearchIndexService` to enable dependency
/// injection and easy testing with in-memory implementations.
///
/// # Collection Initialization
///
/// Call `ensure_collection_exists` before importing documents so the
/// collection and its schema are in place.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Ensure the listings collection exists, creating it if necessary.
    ///
    /// Idempotent: an existing collection is left as is, and losing a creation
    /// race to another process counts as success.
    async fn ensure_collection_exists(&self) -> Result<(), SearchIndexError>;

    /// Upsert documents by id and return a summary of per-document outcomes.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Per-document results; rejected documents are
    ///   reported here rather than as an error
    /// * `Err(SearchIndexError)` - If the request as a whole failed
    async fn import_documents(
        &self,
        documents: &[ListingDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError>;

    /// Execute a compiled search request.
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchIndexError>;

    /// Number of documents currently in the collection.
    async fn document_count(&self) -> Result<u64, SearchIndexError>;
}

#[async_trait]
impl<P: SearchIndexProvider + ?Sized> SearchIndexProvider for std::sync::Arc<P> {
    async fn ensure_collection_exists(&self) -> Result<(), SearchIndexError> {
        (**self).ensure_collection_exists().await
    }

    async fn import_documents(
        &self,
        documents: &[ListingDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        (**self).import_documents(documents).await
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchIndexError> {
        (**self).search(request).await
    }

    async fn document_count(&self) -> Result<u64, SearchIndexError> {
        (**self).document_count().await
    }
}
