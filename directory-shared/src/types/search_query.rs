//! Search query types for the directory.
//!
//! This module defines the structured filter state the directory pages hand to
//! the search layer.

use serde::{Deserialize, Serialize};

/// Default geo radius in meters when a location is supplied without one.
pub const DEFAULT_RADIUS_METERS: f64 = 24_000.0;

/// Fixed number of hits per page.
pub const RESULTS_PER_PAGE: u32 = 20;

/// Facet filters. Absent or empty lists do not constrain the result.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchFacets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brands: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financing: Option<Vec<String>>,
    /// Minimum rating. Zero means "any rating".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl SearchFacets {
    /// Returns true if no facet constrains the result.
    pub fn is_empty(&self) -> bool {
        fn blank(values: &Option<Vec<String>>) -> bool {
            values.as_ref().map_or(true, Vec::is_empty)
        }
        blank(&self.categories)
            && blank(&self.brands)
            && blank(&self.financing)
            && self.rating.map_or(true, |r| r <= 0.0)
    }
}

/// Directory search parameters.
///
/// This struct represents the filter state of a directory page: free text,
/// city, facets, an optional geo radius, and the page number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingSearchQuery {
    /// Free-text query. Absent or blank searches everything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default)]
    pub facets: SearchFacets,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,

    /// Radius around `lat`/`lng`, in meters. Default is 24000.
    #[serde(default = "default_radius")]
    pub radius_meters: f64,

    /// 1-indexed page number. Default is 1.
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_radius() -> f64 {
    DEFAULT_RADIUS_METERS
}

fn default_page() -> u32 {
    1
}

impl Default for ListingSearchQuery {
    fn default() -> Self {
        Self {
            q: None,
            city: None,
            facets: SearchFacets::default(),
            lat: None,
            lng: None,
            radius_meters: default_radius(),
            page: default_page(),
        }
    }
}

impl ListingSearchQuery {
    /// Create a free-text query.
    ///
    /// # Example
    ///
    /// ```
    /// use directory_shared::ListingSearchQuery;
    ///
    /// let query = ListingSearchQuery::text("laser").in_city("Austin").with_page(2);
    /// assert_eq!(query.page, 2);
    /// ```
    pub fn text(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            ..Default::default()
        }
    }

    pub fn in_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_facets(mut self, facets: SearchFacets) -> Self {
        self.facets = facets;
        self
    }

    /// Restrict to a radius around a point.
    pub fn near(mut self, lat: f64, lng: f64, radius_meters: f64) -> Self {
        self.lat = Some(lat);
        self.lng = Some(lng);
        self.radius_meters = radius_meters;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// The free-text term, or `None` when the query selects everything.
    pub fn text_term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// Validate the query parameters.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.page == 0 {
            return Err("page must be 1 or greater".to_string());
        }

        if !self.radius_meters.is_finite() || self.radius_meters < 0.0 {
            return Err("radius must be a non-negative number of meters".to_string());
        }

        if let Some(lat) = self.lat {
            if !(-90.0..=90.0).contains(&lat) {
                return Err("lat must be between -90 and 90".to_string());
            }
        }

        if let Some(lng) = self.lng {
            if !(-180.0..=180.0).contains(&lng) {
                return Err("lng must be between -180 and 180".to_string());
            }
        }

        if let Some(rating) = self.facets.rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err("rating must be between 0 and 5".to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let query: ListingSearchQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.radius_meters, 24_000.0);
        assert_eq!(query.page, 1);
        assert!(query.facets.is_empty());
        assert!(query.text_term().is_none());
        assert_eq!(query, ListingSearchQuery::default());
    }

    #[test]
    fn test_text_term_ignores_blank() {
        assert!(ListingSearchQuery::text("   ").text_term().is_none());
        assert_eq!(ListingSearchQuery::text(" botox ").text_term(), Some("botox"));
    }

    #[test]
    fn test_facets_is_empty() {
        let mut facets = SearchFacets {
            brands: Some(vec![]),
            rating: Some(0.0),
            ..Default::default()
        };
        assert!(facets.is_empty());

        facets.rating = Some(4.0);
        assert!(!facets.is_empty());
    }

    #[test]
    fn test_validation() {
        assert!(ListingSearchQuery::default().validate().is_ok());
        assert!(ListingSearchQuery::default().with_page(0).validate().is_err());
        assert!(ListingSearchQuery::default()
            .near(95.0, 0.0, 1000.0)
            .validate()
            .is_err());
        assert!(ListingSearchQuery::default()
            .near(30.0, -97.0, -5.0)
            .validate()
            .is_err());
    }
}
