//! Listing normalizer.
//!
//! Turns ingestion payloads into normalized upsert records: validates the
//! whole batch up front, derives slugs, applies defaults and fills missing
//! coordinates from the geocoder when it can.

use std::collections::BTreeSet;
use std::sync::Arc;

use directory_shared::types::listing::DEFAULT_COUNTRY;
use directory_shared::{
    derive_listing_slug, IngestChangeset, ListingInput, ListingUpsert, VerticalConfig,
};
use tracing::{debug, instrument, warn};

use crate::errors::IngestError;
use crate::geocoder::Geocoder;

pub struct ListingNormalizer {
    geocoder: Arc<dyn Geocoder>,
    vertical: Arc<VerticalConfig>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim tags, drop blanks and duplicates, keep first-seen order.
fn clean_tags(values: Option<Vec<String>>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}

impl ListingNormalizer {
    pub fn new(geocoder: Arc<dyn Geocoder>, vertical: Arc<VerticalConfig>) -> Self {
        Self { geocoder, vertical }
    }

    /// Validate every listing before anything is written or looked up.
    ///
    /// The error names the zero-based index of the first invalid listing.
    pub fn validate_batch(&self, listings: &[ListingInput]) -> Result<(), IngestError> {
        for (index, listing) in listings.iter().enumerate() {
            listing
                .validate()
                .map_err(|msg| IngestError::validation(format!("listings[{}]: {}", index, msg)))?;

            let has_slug = listing.slug.as_deref().is_some_and(|s| !s.trim().is_empty());
            if !has_slug && derive_listing_slug(&listing.city, &listing.name).is_empty() {
                return Err(IngestError::validation(format!(
                    "listings[{}]: cannot derive a slug from city and name; supply a slug",
                    index
                )));
            }
        }
        Ok(())
    }

    /// Normalize one validated listing.
    ///
    /// Geocoding runs only when both coordinates are missing and a street
    /// address is present. A failed lookup leaves the coordinates unset.
    #[instrument(skip_all, fields(name = %input.name))]
    pub async fn normalize(&self, input: ListingInput) -> ListingUpsert {
        let (mut lat, mut lng) = (input.lat, input.lng);

        if lat.is_none() && lng.is_none() {
            if let Some(query) = input.geocode_query() {
                match self.geocoder.geocode(&query).await {
                    Ok(coords) => {
                        lat = Some(coords.lat);
                        lng = Some(coords.lng);
                    }
                    Err(e) => {
                        warn!(error = %e, query = %query, "Geocoding failed, continuing without coordinates");
                    }
                }
            }
        }

        let (slug, slug_derived) = match clean(input.slug) {
            Some(slug) => (slug, false),
            None => (derive_listing_slug(&input.city, &input.name), true),
        };

        let categories = input.categories.map(|c| clean_tags(Some(c)));

        debug!(slug = %slug, derived = slug_derived, "Normalized listing");

        ListingUpsert {
            slug,
            slug_derived,
            name: input.name.trim().to_string(),
            website: clean(input.website),
            description: clean(input.description),
            phone: clean(input.phone),
            email: clean(input.email),
            address: clean(input.address),
            city: input.city.trim().to_string(),
            state: input.state.trim().to_string(),
            postal_code: input.postal_code.trim().to_string(),
            country: clean(input.country).unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            lat,
            lng,
            rating: input.rating,
            review_count: input.review_count,
            brands: clean_tags(input.brands),
            financing: clean_tags(input.financing),
            categories,
        }
    }

    /// Collect the normalized listings and every category they reference.
    ///
    /// Category labels come from the vertical's taxonomy when it defines the
    /// slug, otherwise from the slug itself.
    pub fn build_changeset(&self, listings: Vec<ListingUpsert>) -> IngestChangeset {
        let referenced: BTreeSet<&str> = listings
            .iter()
            .filter_map(|l| l.categories.as_ref())
            .flatten()
            .map(String::as_str)
            .collect();

        IngestChangeset {
            categories: referenced
                .into_iter()
                .map(|slug| self.vertical.category_seed(slug))
                .collect(),
            listings,
        }
    }
}
