//! Loader module: rebuilds the search mirror from the relational store.

use std::sync::Arc;

use directory_repository::ListingRepository;
use directory_shared::ListingDocument;
use search_index_repository::SearchIndexService;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::errors::IngestError;

/// Default number of listings read from the store per page.
pub const DEFAULT_REINDEX_PAGE_SIZE: usize = 500;

/// Outcome of one full reindex sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReindexReport {
    /// Listings read from the store.
    pub listings_seen: usize,
    /// Documents the search engine accepted.
    pub documents_imported: usize,
    /// Documents the search engine rejected.
    pub documents_failed: usize,
}

/// Rebuilds the search mirror with a full sweep over every listing.
///
/// The sweep is idempotent: documents are upserted by listing id, so running it
/// twice over unchanged data leaves the mirror unchanged.
pub struct IndexMirrorBuilder {
    listings: Arc<dyn ListingRepository>,
    search: Arc<SearchIndexService>,
    page_size: usize,
}

impl IndexMirrorBuilder {
    pub fn new(listings: Arc<dyn ListingRepository>, search: Arc<SearchIndexService>) -> Self {
        Self::with_page_size(listings, search, DEFAULT_REINDEX_PAGE_SIZE)
    }

    pub fn with_page_size(
        listings: Arc<dyn ListingRepository>,
        search: Arc<SearchIndexService>,
        page_size: usize,
    ) -> Self {
        Self {
            listings,
            search,
            page_size: page_size.max(1),
        }
    }

    /// Run one sweep.
    ///
    /// Ensures the collection exists, then reads listings page by page and
    /// imports their documents. Documents rejected by the engine are counted
    /// and logged; store or transport failures abort the sweep.
    #[instrument(skip(self))]
    pub async fn rebuild(&self) -> Result<ReindexReport, IngestError> {
        self.search.ensure_collection().await.map_err(|e| {
            error!(error = %e, "Failed to ensure search collection");
            IngestError::from(e)
        })?;

        let mut report = ReindexReport::default();
        let mut after = None;

        loop {
            let page = self.listings.list_listings_page(after, self.page_size).await?;
            if page.is_empty() {
                break;
            }
            after = page.last().map(|l| l.listing.id);

            let documents: Vec<ListingDocument> =
                page.iter().map(ListingDocument::from_listing).collect();
            let summary = self.search.import_documents(&documents).await?;

            for failure in summary.failures() {
                if let Some(ref err) = failure.error {
                    warn!(document_id = %failure.document_id, error = %err, "Document rejected by search index");
                }
            }

            report.listings_seen += page.len();
            report.documents_imported += summary.succeeded;
            report.documents_failed += summary.failed;
            debug!(page = page.len(), seen = report.listings_seen, "Indexed listing page");

            if page.len() < self.page_size {
                break;
            }
        }

        info!(
            listings_seen = report.listings_seen,
            documents_imported = report.documents_imported,
            documents_failed = report.documents_failed,
            "Reindex sweep complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use directory_repository::InMemoryListingRepository;
    use directory_shared::types::listing::DEFAULT_COUNTRY;
    use directory_shared::{CategorySeed, IngestChangeset, ListingUpsert};
    use search_index_repository::{InMemorySearchProvider, SearchIndexProvider};

    fn search_service(provider: &Arc<InMemorySearchProvider>) -> Arc<SearchIndexService> {
        Arc::new(SearchIndexService::new(Box::new(provider.clone())))
    }

    fn upsert(slug: &str, categories: &[&str]) -> ListingUpsert {
        ListingUpsert {
            slug: slug.to_string(),
            slug_derived: false,
            name: slug.to_string(),
            website: None,
            description: None,
            phone: None,
            email: None,
            address: None,
            city: "Austin".to_string(),
            state: "TX".to_string(),
            postal_code: "78701".to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            lat: None,
            lng: None,
            rating: None,
            review_count: None,
            brands: vec![],
            financing: vec![],
            categories: Some(categories.iter().map(|s| s.to_string()).collect()),
        }
    }

    async fn seeded_store(count: usize) -> Arc<InMemoryListingRepository> {
        let store = Arc::new(InMemoryListingRepository::new());
        store
            .persist_changeset(&IngestChangeset {
                categories: vec![CategorySeed::from_slug("a"), CategorySeed::from_slug("b")],
                listings: (0..count)
                    .map(|i| {
                        let categories: &[&str] = if i % 2 == 0 { &["b", "a"] } else { &["a"] };
                        upsert(&format!("spa-{}", i), categories)
                    })
                    .collect(),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_sweep_mirrors_every_listing() {
        let store = seeded_store(7).await;
        let provider = Arc::new(InMemorySearchProvider::new());
        let service = search_service(&provider);
        let builder = IndexMirrorBuilder::with_page_size(store.clone(), service, 3);

        let report = builder.rebuild().await.unwrap();

        assert_eq!(report.listings_seen, 7);
        assert_eq!(report.documents_imported, 7);
        assert_eq!(report.documents_failed, 0);
        assert!(provider.collection_ready());
        assert_eq!(provider.document_count().await.unwrap(), store.count_listings().await.unwrap());

        for doc in provider.documents().await {
            let stored = store.get_listing(&doc.slug).await.unwrap().unwrap();
            assert_eq!(doc.categories, stored.categories);
            assert_eq!(doc.id, stored.listing.id.to_string());
        }
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent() {
        let store = seeded_store(4).await;
        let provider = Arc::new(InMemorySearchProvider::new());
        let service = search_service(&provider);
        let builder = IndexMirrorBuilder::new(store, service);

        builder.rebuild().await.unwrap();
        let before = provider.documents().await;
        builder.rebuild().await.unwrap();

        assert_eq!(before, provider.documents().await);
    }

    #[tokio::test]
    async fn test_empty_store_and_unavailable_index() {
        let store = Arc::new(InMemoryListingRepository::new());
        let provider = Arc::new(InMemorySearchProvider::new());
        let service = search_service(&provider);
        let builder = IndexMirrorBuilder::new(store, service);

        assert_eq!(builder.rebuild().await.unwrap(), ReindexReport::default());

        provider.set_fail(true);
        let err = builder.rebuild().await.unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Downstream);
    }
}
