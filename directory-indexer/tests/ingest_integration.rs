//! Integration tests for listing ingestion and the search mirror.
//!
//! These tests run the real IngestService, IndexMirrorBuilder and reindex
//! worker against the in-memory store and search provider.

use std::sync::Arc;

use async_trait::async_trait;
use directory_indexer::errors::GeocodeError;
use directory_indexer::geocoder::{Coordinates, Geocoder};
use directory_indexer::processor::ListingNormalizer;
use directory_indexer::{IndexMirrorBuilder, IngestService, ReindexConfig, ReindexWorker};
use directory_repository::{InMemoryLeadRepository, InMemoryListingRepository, ListingRepository};
use directory_shared::{
    IngestPayload, ListingInput, ListingSearchQuery, SearchFacets, VerticalConfig,
};
use search_index_repository::{
    compile, InMemorySearchProvider, SearchIndexProvider, SearchIndexService,
};

const AUSTIN: Coordinates = Coordinates {
    lat: 30.2672,
    lng: -97.7431,
};

/// Geocoder that answers every query with a fixed result.
struct FixedGeocoder(Option<Coordinates>);

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn geocode(&self, _query: &str) -> Result<Coordinates, GeocodeError> {
        self.0.ok_or(GeocodeError::HttpStatus(503))
    }
}

struct Harness {
    store: Arc<InMemoryListingRepository>,
    provider: Arc<InMemorySearchProvider>,
    search: Arc<SearchIndexService>,
    mirror: Arc<IndexMirrorBuilder>,
    ingest: IngestService,
}

fn harness(geocoder: FixedGeocoder, with_worker: bool) -> Harness {
    let store = Arc::new(InMemoryListingRepository::new());
    let provider = Arc::new(InMemorySearchProvider::new());
    let search = Arc::new(SearchIndexService::new(Box::new(provider.clone())));
    let mirror = Arc::new(IndexMirrorBuilder::with_page_size(
        store.clone(),
        search.clone(),
        2,
    ));
    let vertical = Arc::new(VerticalConfig::medspa());

    let reindex = with_worker
        .then(|| ReindexWorker::spawn(mirror.clone(), ReindexConfig::default()).0);

    let ingest = IngestService::new(
        store.clone(),
        Arc::new(InMemoryLeadRepository::new()),
        ListingNormalizer::new(Arc::new(geocoder), vertical.clone()),
        reindex,
        vertical,
    );

    Harness {
        store,
        provider,
        search,
        mirror,
        ingest,
    }
}

fn listing(name: &str, city: &str, categories: &[&str]) -> ListingInput {
    ListingInput {
        name: name.to_string(),
        city: city.to_string(),
        state: "TX".to_string(),
        postal_code: "78701".to_string(),
        categories: Some(categories.iter().map(|c| c.to_string()).collect()),
        ..Default::default()
    }
}

fn payload(listings: Vec<ListingInput>) -> IngestPayload {
    IngestPayload {
        listings,
        reindex: false,
    }
}

fn in_city(city: &str, categories: &[&str]) -> ListingSearchQuery {
    ListingSearchQuery::default()
        .in_city(city)
        .with_facets(SearchFacets {
            categories: Some(categories.iter().map(|c| c.to_string()).collect()),
            ..Default::default()
        })
}

#[tokio::test]
async fn test_reingest_is_idempotent() {
    let h = harness(FixedGeocoder(None), false);
    let batch = vec![listing("Glow Spa", "Austin", &["botox-dysport"])];

    h.ingest.ingest(payload(batch.clone())).await.unwrap();
    let first = h.store.get_listing("austin-glow-spa").await.unwrap().unwrap();
    h.mirror.rebuild().await.unwrap();
    let mirrored = h.provider.documents().await;

    let outcome = h.ingest.ingest(payload(batch)).await.unwrap();
    let second = h.store.get_listing("austin-glow-spa").await.unwrap().unwrap();
    h.mirror.rebuild().await.unwrap();

    assert_eq!(outcome.created, 0);
    assert_eq!(h.store.count_listings().await.unwrap(), 1);
    assert_eq!(first.listing.id, second.listing.id);
    assert_eq!(first.categories, second.categories);
    assert_eq!(mirrored, h.provider.documents().await);
}

#[tokio::test]
async fn test_category_list_is_replaced_exactly() {
    let h = harness(FixedGeocoder(None), false);

    h.ingest
        .ingest(payload(vec![listing("Glow Spa", "Austin", &["a", "b"])]))
        .await
        .unwrap();
    h.ingest
        .ingest(payload(vec![listing("Glow Spa", "Austin", &["b", "c"])]))
        .await
        .unwrap();

    let stored = h.store.get_listing("austin-glow-spa").await.unwrap().unwrap();
    assert_eq!(stored.categories, vec!["b", "c"]);

    h.mirror.rebuild().await.unwrap();
    let doc = h.provider.get(&stored.listing.id.to_string()).await.unwrap();
    assert_eq!(doc.categories, vec!["b", "c"]);
}

#[tokio::test]
async fn test_geocode_failure_still_persists() {
    let h = harness(FixedGeocoder(None), false);
    let mut input = listing("Glow Spa", "Austin", &[]);
    input.address = Some("100 Congress Ave".to_string());

    h.ingest.ingest(payload(vec![input])).await.unwrap();

    let stored = h.store.get_listing("austin-glow-spa").await.unwrap().unwrap();
    assert_eq!((stored.listing.lat, stored.listing.lng), (None, None));

    h.mirror.rebuild().await.unwrap();
    let doc = h.provider.get(&stored.listing.id.to_string()).await.unwrap();
    assert_eq!(doc.location, None);
}

#[tokio::test]
async fn test_geocoded_listing_is_found_by_radius() {
    let h = harness(FixedGeocoder(Some(AUSTIN)), false);
    let mut input = listing("Glow Spa", "Austin", &[]);
    input.address = Some("100 Congress Ave".to_string());
    h.ingest.ingest(payload(vec![input])).await.unwrap();
    h.mirror.rebuild().await.unwrap();

    let near = h
        .search
        .search_listings(&ListingSearchQuery::default().near(30.27, -97.74, 5_000.0))
        .await
        .unwrap();
    assert_eq!(near.slugs(), vec!["austin-glow-spa"]);

    // Dallas is about 300km away.
    let far = h
        .search
        .search_listings(&ListingSearchQuery::default().near(32.7767, -96.7970, 24_000.0))
        .await
        .unwrap();
    assert!(far.is_empty());
}

#[tokio::test]
async fn test_mirror_matches_store_after_rebuild() {
    let h = harness(FixedGeocoder(None), false);
    h.ingest
        .ingest(payload(vec![
            listing("Glow Spa", "Austin", &["botox-dysport", "fillers"]),
            listing("Radiance", "Austin", &["fillers"]),
            listing("Smooth", "Dallas", &[]),
            listing("Clear Skin", "Houston", &["laser-hair-removal"]),
            listing("Renew", "Austin", &["botox-dysport"]),
        ]))
        .await
        .unwrap();

    let report = h.mirror.rebuild().await.unwrap();

    assert_eq!(report.listings_seen, 5);
    assert_eq!(
        h.provider.document_count().await.unwrap(),
        h.store.count_listings().await.unwrap()
    );
    for doc in h.provider.documents().await {
        let stored = h.store.get_listing(&doc.slug).await.unwrap().unwrap();
        assert_eq!(doc.categories, stored.categories);
    }
}

#[tokio::test]
async fn test_plan_weight_ranks_first() {
    let h = harness(FixedGeocoder(None), false);
    h.ingest
        .ingest(payload(vec![
            listing("Glow Spa", "Austin", &["botox-dysport"]),
            listing("Radiance", "Austin", &["botox-dysport"]),
        ]))
        .await
        .unwrap();
    assert!(h.store.set_plan_weight("austin-radiance", 20).await);
    h.mirror.rebuild().await.unwrap();

    let response = h
        .search
        .search_listings(&in_city("Austin", &["botox-dysport"]))
        .await
        .unwrap();

    assert_eq!(response.found, 2);
    assert_eq!(response.hits[0].document.slug, "austin-radiance");
    assert_eq!(response.hits[0].document.plan_weight, 20);
}

#[tokio::test]
async fn test_ingested_listing_is_searchable() {
    let h = harness(FixedGeocoder(None), false);
    h.ingest
        .ingest(payload(vec![
            listing("Glow Spa", "Austin", &["botox-dysport"]),
            listing("Radiance", "Austin", &["fillers"]),
        ]))
        .await
        .unwrap();
    h.mirror.rebuild().await.unwrap();

    let response = h
        .search
        .search_listings(&in_city("austin", &["botox-dysport"]))
        .await
        .unwrap();

    assert_eq!(response.found, 1);
    assert_eq!(response.slugs(), vec!["austin-glow-spa"]);
}

#[tokio::test]
async fn test_category_with_structural_characters_is_searchable() {
    let h = harness(FixedGeocoder(None), false);
    h.ingest
        .ingest(payload(vec![
            listing("Glow Spa", "Austin", &["botox, dysport"]),
            listing("Radiance", "Austin", &["botox"]),
        ]))
        .await
        .unwrap();
    h.mirror.rebuild().await.unwrap();

    let stored = h.store.get_listing("austin-glow-spa").await.unwrap().unwrap();
    assert_eq!(stored.categories, vec!["botox, dysport"]);

    let query = in_city("austin", &["botox, dysport"]);
    assert_eq!(
        compile(&query).unwrap().filter.encode().unwrap(),
        "city:=`austin` && categories:=[`botox, dysport`]"
    );

    let response = h.search.search_listings(&query).await.unwrap();
    assert_eq!(response.slugs(), vec!["austin-glow-spa"]);
}

#[tokio::test]
async fn test_ingest_requests_background_reindex() {
    let h = harness(FixedGeocoder(None), true);
    let outcome = h
        .ingest
        .ingest(IngestPayload {
            listings: vec![listing("Glow Spa", "Austin", &["botox-dysport"])],
            reindex: true,
        })
        .await
        .unwrap();
    assert!(outcome.reindex_requested);

    let stats = h
        .ingest
        .reindex_handle()
        .unwrap()
        .wait_for_sweeps(1)
        .await;
    assert_eq!(stats.completed, 1);
    assert_eq!(h.provider.document_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_failed_reindex_does_not_fail_ingest() {
    let h = harness(FixedGeocoder(None), true);
    h.provider.set_fail(true);

    let outcome = h
        .ingest
        .ingest(IngestPayload {
            listings: vec![listing("Glow Spa", "Austin", &[])],
            reindex: true,
        })
        .await
        .unwrap();

    assert_eq!(outcome.slugs, vec!["austin-glow-spa"]);
    assert_eq!(h.store.count_listings().await.unwrap(), 1);
}
