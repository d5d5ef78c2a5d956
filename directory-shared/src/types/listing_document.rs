//! Listing document types for the search index.
//!
//! This module defines the flat projection of a listing that is mirrored into
//! the search engine.

use serde::{Deserialize, Serialize};

use super::listing::ListingWithCategories;

/// Document representation for the search index.
///
/// This struct represents a listing as it is stored in the search engine.
/// Unset numeric fields serialize as `null`; the composite `location`
/// geopoint is only present when both coordinates are known.
///
/// # Fields
///
/// - `id`: The listing's relational identifier, used as the document id
/// - `slug`: Unique URL-safe identifier
/// - `name`: Display name (primary search field)
/// - `city`: City (faceted, exact-match filter)
/// - `categories`: Category slugs joined to the listing
/// - `brands`: Brand tags
/// - `financing`: Financing-option tags
/// - `rating`: Aggregate rating, if known
/// - `plan_weight`: Paid-tier ranking weight (serialized as `planWeight`)
/// - `lat` / `lng`: Coordinates, if known
/// - `location`: `[lat, lng]` geopoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingDocument {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub city: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub brands: Vec<String>,
    #[serde(default)]
    pub financing: Vec<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(rename = "planWeight", default)]
    pub plan_weight: i32,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<[f64; 2]>,
}

impl ListingDocument {
    /// Project a stored listing into its search document.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use directory_shared::{ListingDocument, ListingWithCategories};
    ///
    /// fn project(row: &ListingWithCategories) -> ListingDocument {
    ///     ListingDocument::from_listing(row)
    /// }
    /// ```
    pub fn from_listing(row: &ListingWithCategories) -> Self {
        let listing = &row.listing;
        let location = match (listing.lat, listing.lng) {
            (Some(lat), Some(lng)) => Some([lat, lng]),
            _ => None,
        };

        let mut categories = row.categories.clone();
        categories.sort();
        categories.dedup();

        Self {
            id: listing.id.to_string(),
            slug: listing.slug.clone(),
            name: listing.name.clone(),
            city: listing.city.clone(),
            categories,
            brands: listing.brands.clone(),
            financing: listing.financing.clone(),
            rating: listing.rating,
            plan_weight: listing.plan_weight,
            lat: listing.lat,
            lng: listing.lng,
            location,
        }
    }

    /// Generate the document ID used in the search index.
    pub fn document_id(&self) -> &str {
        &self.id
    }
}
