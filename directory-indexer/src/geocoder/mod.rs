//! Address to coordinate lookup.

use async_trait::async_trait;

use crate::errors::GeocodeError;

mod mapbox;

pub use mapbox::{MapboxGeocoder, DEFAULT_GEOCODER_BASE_URL};

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Forward geocoding of a free-text address.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve `query` to the coordinates of the best match.
    async fn geocode(&self, query: &str) -> Result<Coordinates, GeocodeError>;
}
