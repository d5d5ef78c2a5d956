//! Search index service implementation.
//!
//! This module provides the main service for interacting with the search index.
//! Application code uses it to keep the listings collection in place, mirror
//! documents into it and run directory queries against it.

use directory_shared::{ListingDocument, ListingSearchQuery, SearchResponse};
use tracing::{debug, instrument};

use crate::config::SearchIndexServiceConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::query::compile;
use crate::types::BatchOperationSummary;

/// The main service for interacting with the search index.
///
/// This is the high-level API that application code should use. It compiles
/// directory queries, splits imports into bounded requests and delegates to a
/// `SearchIndexProvider` for the actual backend operations.
///
/// # Example
///
/// ```no_run
/// use search_index_repository::typesense::{TypesenseConfig, TypesenseProvider};
/// use search_index_repository::SearchIndexService;
/// use directory_shared::ListingSearchQuery;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = TypesenseProvider::new(TypesenseConfig::from_env()?)?;
/// let service = SearchIndexService::new(Box::new(provider));
///
/// service.ensure_collection().await?;
/// let response = service
///     .search_listings(&ListingSearchQuery::text("botox").in_city("Austin"))
///     .await?;
/// println!("{} listings", response.found);
/// # Ok(())
/// # }
/// ```
pub struct SearchIndexService {
    provider: Box<dyn SearchIndexProvider>,
    config: SearchIndexServiceConfig,
}

impl SearchIndexService {
    /// Create a new SearchIndexService with default configuration.
    pub fn new(provider: Box<dyn SearchIndexProvider>) -> Self {
        Self {
            provider,
            config: SearchIndexServiceConfig::default(),
        }
    }

    /// Create a new SearchIndexService with custom configuration.
    pub fn with_config(
        provider: Box<dyn SearchIndexProvider>,
        config: SearchIndexServiceConfig,
    ) -> Self {
        Self { provider, config }
    }

    /// Retrieve the listings collection, creating it with the listings schema
    /// if it does not exist.
    pub async fn ensure_collection(&self) -> Result<(), SearchIndexError> {
        self.provider.ensure_collection_exists().await
    }

    /// Upsert documents by id.
    ///
    /// Documents are sent in chunks of at most `import_chunk_size`. Rejected
    /// documents are reported in the summary; a failed request aborts the
    /// remaining chunks and is returned as an error.
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub async fn import_documents(
        &self,
        documents: &[ListingDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut summary = BatchOperationSummary::default();
        for chunk in documents.chunks(self.config.import_chunk_size.max(1)) {
            let result = self.provider.import_documents(chunk).await?;
            debug!(
                chunk = chunk.len(),
                failed = result.failed,
                "Imported document chunk"
            );
            summary.merge(result);
        }
        Ok(summary)
    }

    /// Run a directory query.
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResponse)` - Hits for the requested page, ranked by plan
    ///   weight then text relevance, with facet counts
    /// * `Err(SearchIndexError::ValidationError)` - If the query is out of range
    /// * `Err(SearchIndexError)` - If the search engine call fails
    pub async fn search_listings(
        &self,
        query: &ListingSearchQuery,
    ) -> Result<SearchResponse, SearchIndexError> {
        let request = compile(query)?;
        self.provider.search(&request).await
    }

    /// Number of documents in the collection.
    pub async fn document_count(&self) -> Result<u64, SearchIndexError> {
        self.provider.document_count().await
    }
}
