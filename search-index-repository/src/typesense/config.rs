//! Connection settings for a Typesense node.

use std::env;
use std::time::Duration;

use crate::errors::SearchIndexError;

/// Name of the collection holding listing documents.
pub const LISTINGS_COLLECTION: &str = "listings";

/// Default transport timeout in seconds.
const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 8;

const DEFAULT_PROTOCOL: &str = "https";

/// Configuration for a single Typesense node.
#[derive(Debug, Clone, PartialEq)]
pub struct TypesenseConfig {
    pub host: String,
    pub port: u16,
    pub protocol: String,
    pub api_key: String,
    pub collection: String,
    pub connection_timeout: Duration,
}

impl TypesenseConfig {
    /// Read the configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TYPESENSE_HOST`: host name, optionally with scheme and port (required)
    /// - `TYPESENSE_API_KEY`: admin API key (required)
    /// - `TYPESENSE_PROTOCOL`: `https` or `http` (default: https)
    /// - `TYPESENSE_PORT`: overrides the port in `TYPESENSE_HOST`
    /// - `TYPESENSE_CONNECTION_TIMEOUT_SECS`: transport timeout (default: 8)
    pub fn from_env() -> Result<Self, SearchIndexError> {
        let host = env::var("TYPESENSE_HOST").unwrap_or_default();
        let api_key = env::var("TYPESENSE_API_KEY").unwrap_or_default();
        let protocol = env::var("TYPESENSE_PROTOCOL").ok();
        let port = env::var("TYPESENSE_PORT").ok();
        let timeout = env::var("TYPESENSE_CONNECTION_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_CONNECTION_TIMEOUT_SECS);

        Self::from_parts(&host, &api_key, protocol.as_deref(), port.as_deref())
            .map(|config| config.with_timeout(Duration::from_secs(timeout)))
    }

    /// Build a configuration from raw setting values.
    ///
    /// The host may carry an `http://` or `https://` prefix, a trailing slash
    /// and a `:port` suffix. The port is taken from `port` if given, else from
    /// the host, else 443 for https and 8108 for http.
    pub fn from_parts(
        host: &str,
        api_key: &str,
        protocol: Option<&str>,
        port: Option<&str>,
    ) -> Result<Self, SearchIndexError> {
        let host = host.trim();
        let api_key = api_key.trim();
        if host.is_empty() || api_key.is_empty() {
            return Err(SearchIndexError::config(
                "TYPESENSE_API_KEY and TYPESENSE_HOST must be set",
            ));
        }

        let protocol = protocol
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PROTOCOL)
            .to_lowercase();
        if protocol != "https" && protocol != "http" {
            return Err(SearchIndexError::config(format!(
                "Unsupported TYPESENSE_PROTOCOL '{}'",
                protocol
            )));
        }

        let bare = host
            .strip_prefix("https://")
            .or_else(|| host.strip_prefix("http://"))
            .unwrap_or(host)
            .trim_end_matches('/');
        let (hostname, host_port) = match bare.split_once(':') {
            Some((name, port)) => (name, Some(port)),
            None => (bare, None),
        };
        if hostname.is_empty() {
            return Err(SearchIndexError::config("TYPESENSE_HOST has no host name"));
        }

        let port = match port.map(str::trim).filter(|p| !p.is_empty()).or(host_port) {
            Some(p) => p.parse::<u16>().map_err(|e| {
                SearchIndexError::config(format!("Invalid Typesense port '{}': {}", p, e))
            })?,
            None if protocol == "https" => 443,
            None => 8108,
        };

        Ok(Self {
            host: hostname.to_string(),
            port,
            protocol,
            api_key: api_key.to_string(),
            collection: LISTINGS_COLLECTION.to_string(),
            connection_timeout: Duration::from_secs(DEFAULT_CONNECTION_TIMEOUT_SECS),
        })
    }

    /// Configuration pointing at a full base URL, e.g. a local test server.
    pub fn for_base_url(base_url: &str, api_key: &str) -> Result<Self, SearchIndexError> {
        let url = url::Url::parse(base_url)
            .map_err(|e| SearchIndexError::config(format!("Invalid base URL: {}", e)))?;
        let port = url.port_or_known_default().map(|p| p.to_string());
        Self::from_parts(
            url.host_str().unwrap_or_default(),
            api_key,
            Some(url.scheme()),
            port.as_deref(),
        )
    }

    pub fn with_timeout(mut self, connection_timeout: Duration) -> Self {
        self.connection_timeout = connection_timeout;
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// `protocol://host:port`, without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}
