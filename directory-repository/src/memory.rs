//! In-memory implementations of the repository traits.
//!
//! These follow the same upsert, slug and join rules as the PostgreSQL store
//! and are used to exercise the ingestion and reindex paths without a database.
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use directory_shared::slug::{slug_candidate, MAX_SLUG_SUFFIX};
use directory_shared::{
    Category, CategorySeed, IngestChangeset, Listing, ListingUpsert, ListingWithCategories, NewLead,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::RepositoryError;
use crate::interfaces::{LeadRepository, ListingRepository};
use crate::types::PersistedListing;

#[derive(Debug, Clone, Default)]
struct Store {
    categories: BTreeMap<String, Category>,
    /// Listings keyed by slug.
    listings: BTreeMap<String, Listing>,
    /// Category slugs joined to each listing id.
    joins: HashMap<Uuid, BTreeSet<String>>,
}

impl Store {
    fn upsert_categories(&mut self, seeds: &[CategorySeed]) {
        for seed in seeds {
            self.categories
                .entry(seed.slug.clone())
                .and_modify(|c| c.label = seed.label.clone())
                .or_insert_with(|| Category {
                    id: Uuid::new_v4(),
                    slug: seed.slug.clone(),
                    label: seed.label.clone(),
                });
        }
    }

    fn resolve_slug(&self, listing: &ListingUpsert) -> Result<String, RepositoryError> {
        if !listing.slug_derived {
            return Ok(listing.slug.clone());
        }

        for attempt in 1..=MAX_SLUG_SUFFIX {
            let candidate = slug_candidate(&listing.slug, attempt);
            match self.listings.get(&candidate) {
                None => return Ok(candidate),
                Some(existing)
                    if listing.same_identity(&existing.name, &existing.city, &existing.state) =>
                {
                    return Ok(candidate)
                }
                Some(_) => continue,
            }
        }

        Err(RepositoryError::SlugExhausted {
            slug: listing.slug.clone(),
            attempts: MAX_SLUG_SUFFIX,
        })
    }

    fn upsert_listing(&mut self, slug: &str, input: &ListingUpsert) -> (Uuid, bool) {
        let now = Utc::now();

        if let Some(existing) = self.listings.get_mut(slug) {
            existing.name = input.name.clone();
            merge(&mut existing.website, &input.website);
            merge(&mut existing.description, &input.description);
            merge(&mut existing.phone, &input.phone);
            merge(&mut existing.email, &input.email);
            merge(&mut existing.address, &input.address);
            existing.city = input.city.clone();
            existing.state = input.state.clone();
            existing.postal_code = input.postal_code.clone();
            existing.country = input.country.clone();
            merge(&mut existing.lat, &input.lat);
            merge(&mut existing.lng, &input.lng);
            merge(&mut existing.rating, &input.rating);
            merge(&mut existing.review_count, &input.review_count);
            existing.brands = input.brands.clone();
            existing.financing = input.financing.clone();
            existing.updated_at = now;
            return (existing.id, false);
        }

        let id = Uuid::new_v4();
        self.listings.insert(
            slug.to_string(),
            Listing {
                id,
                slug: slug.to_string(),
                name: input.name.clone(),
                website: input.website.clone(),
                description: input.description.clone(),
                phone: input.phone.clone(),
                email: input.email.clone(),
                address: input.address.clone(),
                city: input.city.clone(),
                state: input.state.clone(),
                postal_code: input.postal_code.clone(),
                country: input.country.clone(),
                lat: input.lat,
                lng: input.lng,
                rating: input.rating,
                review_count: input.review_count,
                brands: input.brands.clone(),
                financing: input.financing.clone(),
                plan_weight: 0,
                created_at: now,
                updated_at: now,
            },
        );
        (id, true)
    }

    fn replace_categories(&mut self, listing_id: Uuid, slugs: &[String]) {
        let known: BTreeSet<String> = slugs
            .iter()
            .filter(|s| self.categories.contains_key(s.as_str()))
            .cloned()
            .collect();
        self.joins.insert(listing_id, known);
    }

    fn with_categories(&self, listing: &Listing) -> ListingWithCategories {
        let categories = self
            .joins
            .get(&listing.id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        ListingWithCategories {
            listing: listing.clone(),
            categories,
        }
    }
}

/// Keep the stored value when the update leaves the field out.
fn merge<T: Clone>(stored: &mut Option<T>, update: &Option<T>) {
    if update.is_some() {
        *stored = update.clone();
    }
}

/// In-memory listing store.
#[derive(Default)]
pub struct InMemoryListingRepository {
    store: RwLock<Store>,
    fail_writes: AtomicBool,
}

impl InMemoryListingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with [`RepositoryError::Unavailable`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Sets a listing's plan weight, as plan assignment would.
    pub async fn set_plan_weight(&self, slug: &str, plan_weight: i32) -> bool {
        let mut store = self.store.write().await;
        match store.listings.get_mut(slug) {
            Some(listing) => {
                listing.plan_weight = plan_weight;
                true
            }
            None => false,
        }
    }

    fn check_writable(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "writes are disabled".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ListingRepository for InMemoryListingRepository {
    async fn persist_changeset(
        &self,
        changeset: &IngestChangeset,
    ) -> Result<Vec<PersistedListing>, RepositoryError> {
        self.check_writable()?;
        let mut store = self.store.write().await;

        // Work on a copy so a failure leaves the store untouched.
        let mut staged = store.clone();
        staged.upsert_categories(&changeset.categories);

        let mut persisted = Vec::with_capacity(changeset.listings.len());
        for listing in &changeset.listings {
            let slug = staged.resolve_slug(listing)?;
            let (id, created) = staged.upsert_listing(&slug, listing);
            if let Some(ref categories) = listing.categories {
                staged.replace_categories(id, categories);
            }
            persisted.push(PersistedListing { id, slug, created });
        }

        *store = staged;
        Ok(persisted)
    }

    async fn upsert_categories(&self, categories: &[CategorySeed]) -> Result<(), RepositoryError> {
        self.check_writable()?;
        self.store.write().await.upsert_categories(categories);
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(self.store.read().await.categories.values().cloned().collect())
    }

    async fn find_listing_id_by_slug(&self, slug: &str) -> Result<Option<Uuid>, RepositoryError> {
        Ok(self.store.read().await.listings.get(slug).map(|l| l.id))
    }

    async fn get_listing(
        &self,
        slug: &str,
    ) -> Result<Option<ListingWithCategories>, RepositoryError> {
        let store = self.store.read().await;
        Ok(store.listings.get(slug).map(|l| store.with_categories(l)))
    }

    async fn list_listings_page(
        &self,
        after: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<ListingWithCategories>, RepositoryError> {
        let store = self.store.read().await;
        let mut listings: Vec<&Listing> = store
            .listings
            .values()
            .filter(|l| after.map_or(true, |after| l.id > after))
            .collect();
        listings.sort_by_key(|l| l.id);

        Ok(listings
            .into_iter()
            .take(limit)
            .map(|l| store.with_categories(l))
            .collect())
    }

    async fn count_listings(&self) -> Result<u64, RepositoryError> {
        Ok(self.store.read().await.listings.len() as u64)
    }
}

/// In-memory lead store.
#[derive(Default)]
pub struct InMemoryLeadRepository {
    leads: RwLock<Vec<(Uuid, NewLead)>>,
}

impl InMemoryLeadRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All leads inserted so far, oldest first.
    pub async fn leads(&self) -> Vec<(Uuid, NewLead)> {
        self.leads.read().await.clone()
    }
}

#[async_trait]
impl LeadRepository for InMemoryLeadRepository {
    async fn insert_lead(&self, lead: &NewLead) -> Result<Uuid, RepositoryError> {
        let id = Uuid::new_v4();
        self.leads.write().await.push((id, lead.clone()));
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use directory_shared::types::listing::DEFAULT_COUNTRY;

    fn upsert(name: &str, slug: &str, derived: bool, categories: Option<&[&str]>) -> ListingUpsert {
        ListingUpsert {
            slug: slug.to_string(),
            slug_derived: derived,
            name: name.to_string(),
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
            categories: categories.map(|c| c.iter().map(|s| s.to_string()).collect()),
        }
    }

    fn changeset(categories: &[&str], listings: Vec<ListingUpsert>) -> IngestChangeset {
        IngestChangeset {
            categories: categories.iter().map(|s| CategorySeed::from_slug(s)).collect(),
            listings,
        }
    }

    #[tokio::test]
    async fn test_category_replacement_is_exact() {
        let repo = InMemoryListingRepository::new();
        let slug = "austin-glow-spa";

        repo.persist_changeset(&changeset(
            &["a", "b"],
            vec![upsert("Glow Spa", slug, true, Some(&["a", "b"]))],
        ))
        .await
        .unwrap();

        repo.persist_changeset(&changeset(
            &["b", "c"],
            vec![upsert("Glow Spa", slug, true, Some(&["b", "c", "b"]))],
        ))
        .await
        .unwrap();

        let stored = repo.get_listing(slug).await.unwrap().unwrap();
        assert_eq!(stored.categories, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_absent_categories_leave_joins_and_unknown_are_skipped() {
        let repo = InMemoryListingRepository::new();
        let slug = "austin-glow-spa";

        repo.persist_changeset(&changeset(
            &["a"],
            vec![upsert("Glow Spa", slug, false, Some(&["a", "ghost"]))],
        ))
        .await
        .unwrap();
        repo.persist_changeset(&changeset(&[], vec![upsert("Glow Spa", slug, false, None)]))
            .await
            .unwrap();

        let stored = repo.get_listing(slug).await.unwrap().unwrap();
        assert_eq!(stored.categories, vec!["a"]);
    }

    #[tokio::test]
    async fn test_update_keeps_plan_weight_and_absent_scalars() {
        let repo = InMemoryListingRepository::new();
        let slug = "austin-glow-spa";

        let mut first = upsert("Glow Spa", slug, false, None);
        first.phone = Some("512-555-0100".to_string());
        first.brands = vec!["Allergan".to_string()];
        let created = repo
            .persist_changeset(&changeset(&[], vec![first]))
            .await
            .unwrap();
        assert!(created[0].created);
        assert!(repo.set_plan_weight(slug, 100).await);

        let updated = repo
            .persist_changeset(&changeset(&[], vec![upsert("Glow Spa", slug, false, None)]))
            .await
            .unwrap();
        assert!(!updated[0].created);
        assert_eq!(updated[0].id, created[0].id);

        let stored = repo.get_listing(slug).await.unwrap().unwrap().listing;
        assert_eq!(stored.plan_weight, 100);
        assert_eq!(stored.phone.as_deref(), Some("512-555-0100"));
        assert!(stored.brands.is_empty());
    }

    #[tokio::test]
    async fn test_derived_slug_collision_gets_suffix() {
        let repo = InMemoryListingRepository::new();

        let other = upsert("Glow-Spa", "austin-glow-spa", true, None);
        let persisted = repo
            .persist_changeset(&changeset(
                &[],
                vec![upsert("Glow Spa", "austin-glow-spa", true, None), other],
            ))
            .await
            .unwrap();

        assert_eq!(persisted[0].slug, "austin-glow-spa");
        assert_eq!(persisted[1].slug, "austin-glow-spa-2");

        // Re-ingesting the second business lands on its suffixed row.
        let again = repo
            .persist_changeset(&changeset(
                &[],
                vec![upsert("Glow-Spa", "austin-glow-spa", true, None)],
            ))
            .await
            .unwrap();
        assert_eq!(again[0].slug, "austin-glow-spa-2");
        assert_eq!(repo.count_listings().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_explicit_slug_overwrites() {
        let repo = InMemoryListingRepository::new();
        repo.persist_changeset(&changeset(&[], vec![upsert("Glow Spa", "glow", false, None)]))
            .await
            .unwrap();
        repo.persist_changeset(&changeset(&[], vec![upsert("Other Spa", "glow", false, None)]))
            .await
            .unwrap();

        assert_eq!(repo.count_listings().await.unwrap(), 1);
        let stored = repo.get_listing("glow").await.unwrap().unwrap();
        assert_eq!(stored.listing.name, "Other Spa");
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_store_untouched() {
        let repo = InMemoryListingRepository::new();
        let mut listings = vec![upsert("Glow Spa", "austin-glow-spa", true, None)];
        // 100 unrelated businesses already own every candidate.
        let mut seed = Vec::new();
        for attempt in 1..=MAX_SLUG_SUFFIX {
            seed.push(upsert(
                &format!("Taken {}", attempt),
                &slug_candidate("austin-spa", attempt),
                false,
                None,
            ));
        }
        repo.persist_changeset(&changeset(&[], seed)).await.unwrap();
        listings.push(upsert("Spa", "austin-spa", true, None));

        let err = repo
            .persist_changeset(&changeset(&["a"], listings))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::SlugExhausted { .. }));
        assert!(repo.get_listing("austin-glow-spa").await.unwrap().is_none());
        assert!(repo.list_categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pages_cover_all_listings() {
        let repo = InMemoryListingRepository::new();
        let listings = (0..5)
            .map(|i| upsert(&format!("Spa {}", i), &format!("spa-{}", i), false, None))
            .collect();
        repo.persist_changeset(&changeset(&[], listings)).await.unwrap();

        let mut seen = Vec::new();
        let mut after = None;
        loop {
            let page = repo.list_listings_page(after, 2).await.unwrap();
            if page.is_empty() {
                break;
            }
            after = page.last().map(|l| l.listing.id);
            seen.extend(page.into_iter().map(|l| l.listing.slug));
        }
        seen.sort();
        assert_eq!(seen, vec!["spa-0", "spa-1", "spa-2", "spa-3", "spa-4"]);
    }

    #[tokio::test]
    async fn test_fail_writes() {
        let repo = InMemoryListingRepository::new();
        repo.set_fail_writes(true);
        let err = repo.upsert_categories(&[CategorySeed::from_slug("a")]).await;
        assert!(matches!(err, Err(RepositoryError::Unavailable(_))));
    }
}
