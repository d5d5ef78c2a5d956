// Request and response shapes for the HTTP surface
use directory_indexer::ErrorKind;
use directory_shared::{ListingSearchQuery, SearchFacets};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Success envelope: `{ "ok": true, ...data }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { ok: true, data }
    }
}

/// Failure envelope: `{ "ok": false, "error": "...", "kind": "validation" }`.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub ok: bool,
    pub error: String,
    pub kind: ErrorKind,
}

#[derive(Debug, Serialize)]
pub struct LeadCreated {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub vertical: String,
}

/// Query string of `GET /api/search`.
///
/// List filters are comma separated. `category` and `categories` are merged.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub categories: Option<String>,
    pub brands: Option<String>,
    pub financing: Option<String>,
    pub rating: Option<f64>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Meters.
    pub radius: Option<f64>,
    pub page: Option<u32>,
}

fn split_list(values: &[Option<&str>]) -> Option<Vec<String>> {
    let present: Vec<&str> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    Some(
        present
            .iter()
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

impl SearchParams {
    pub fn into_query(self) -> ListingSearchQuery {
        let defaults = ListingSearchQuery::default();
        ListingSearchQuery {
            facets: SearchFacets {
                categories: split_list(&[self.category.as_deref(), self.categories.as_deref()]),
                brands: split_list(&[self.brands.as_deref()]),
                financing: split_list(&[self.financing.as_deref()]),
                rating: self.rating,
            },
            q: self.q,
            city: self.city,
            lat: self.lat,
            lng: self.lng,
            radius_meters: self.radius.unwrap_or(defaults.radius_meters),
            page: self.page.unwrap_or(defaults.page),
        }
    }
}
