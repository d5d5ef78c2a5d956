use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{Coordinates, Geocoder};
use crate::errors::GeocodeError;

pub const DEFAULT_GEOCODER_BASE_URL: &str = "https://api.mapbox.com";

const DEFAULT_GEOCODER_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    /// `[lng, lat]`
    center: Option<[f64; 2]>,
}

/// Mapbox forward geocoding client.
///
/// Without an access token every lookup fails with
/// [`GeocodeError::MissingCredential`] and no request is sent.
pub struct MapboxGeocoder {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl MapboxGeocoder {
    pub fn new(
        base_url: &str,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Build a geocoder from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `MAPBOX_TOKEN`: access token (optional; geocoding is disabled without it)
    /// - `GEOCODER_BASE_URL`: API base URL (default: https://api.mapbox.com)
    /// - `GEOCODER_TIMEOUT_SECS`: transport timeout (default: 5)
    pub fn from_env() -> Result<Self, GeocodeError> {
        let base_url = env::var("GEOCODER_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GEOCODER_BASE_URL.to_string());
        let timeout = env::var("GEOCODER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_GEOCODER_TIMEOUT_SECS);

        Self::new(
            &base_url,
            env::var("MAPBOX_TOKEN").ok(),
            Duration::from_secs(timeout),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.access_token.is_some()
    }

    fn request_url(&self, query: &str, token: &str) -> Result<Url, GeocodeError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| GeocodeError::Transport(format!("invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| GeocodeError::Transport("base URL cannot have a path".to_string()))?
            .pop_if_empty()
            .extend(["geocoding", "v5", "mapbox.places"])
            .push(&format!("{}.json", query));
        url.query_pairs_mut()
            .append_pair("limit", "1")
            .append_pair("access_token", token);
        Ok(url)
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn geocode(&self, query: &str) -> Result<Coordinates, GeocodeError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(GeocodeError::MissingCredential)?;

        let response = self
            .client
            .get(self.request_url(query, token)?)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(GeocodeError::HttpStatus(response.status().as_u16()));
        }

        let body: FeatureCollection = response.json().await?;
        let [lng, lat] = body
            .features
            .into_iter()
            .next()
            .and_then(|f| f.center)
            .ok_or(GeocodeError::NoMatch)?;

        debug!(query = %query, lat, lng, "Geocoded address");
        Ok(Coordinates { lat, lng })
    }
}
