//! This module defines the `ListingRepository` trait, which provides an interface
//! for interacting with the underlying data store for listings and categories.
use async_trait::async_trait;
use directory_shared::{Category, CategorySeed, IngestChangeset, ListingWithCategories};
use uuid::Uuid;

use crate::errors::RepositoryError;
use crate::types::PersistedListing;

/// A trait that defines the interface for interacting with the listing store.
///
/// Listings are keyed by slug. Writes go through [`persist_changeset`], which
/// applies a whole ingestion batch atomically.
///
/// [`persist_changeset`]: ListingRepository::persist_changeset
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Persists a changeset in a single unit of work.
    ///
    /// Category seeds are upserted first. Then, for each listing in order, the
    /// slug is resolved (derived slugs are disambiguated against unrelated
    /// listings), the row is upserted, and its category joins are replaced when
    /// the listing carries a category list. Either every listing is written or
    /// none is.
    ///
    /// # Arguments
    ///
    /// * `changeset` - Category seeds and normalized listings to persist.
    ///
    /// # Returns
    ///
    /// The stored id and final slug of each listing, in input order.
    async fn persist_changeset(
        &self,
        changeset: &IngestChangeset,
    ) -> Result<Vec<PersistedListing>, RepositoryError>;

    /// Creates or relabels categories.
    async fn upsert_categories(&self, categories: &[CategorySeed]) -> Result<(), RepositoryError>;

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;

    async fn find_listing_id_by_slug(&self, slug: &str) -> Result<Option<Uuid>, RepositoryError>;

    async fn get_listing(&self, slug: &str)
        -> Result<Option<ListingWithCategories>, RepositoryError>;

    /// Returns up to `limit` listings with an id greater than `after`, ordered by id.
    ///
    /// Used to stream the whole table in pages without holding it in memory.
    async fn list_listings_page(
        &self,
        after: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<ListingWithCategories>, RepositoryError>;

    async fn count_listings(&self) -> Result<u64, RepositoryError>;
}
