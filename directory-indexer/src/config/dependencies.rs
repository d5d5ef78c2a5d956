//! Dependency initialization and wiring for the directory indexer.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use directory_repository::{
    run_migrations, LeadRepository, ListingRepository, PostgresLeadRepository,
    PostgresListingRepository,
};
use directory_shared::VerticalConfig;
use search_index_repository::{
    SearchIndexService, SearchIndexServiceConfig, TypesenseConfig, TypesenseProvider,
};
use sqlx::postgres::PgPoolOptions;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::geocoder::{Geocoder, MapboxGeocoder};
use crate::loader::{IndexMirrorBuilder, DEFAULT_REINDEX_PAGE_SIZE};
use crate::orchestrator::IngestService;
use crate::processor::ListingNormalizer;
use crate::reindex::{ReindexConfig, ReindexWorker};
use crate::IndexingError;

/// Default number of pooled database connections.
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Vertical used when `VERTICAL` is not set.
const DEFAULT_VERTICAL: &str = "medspa";

/// Connection mode for the search engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection on an interval until successful.
    Retry,
}

impl ConnectionMode {
    /// Parse connection mode from `SEARCH_CONNECTION_MODE`.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Defaults to "retry" if not set or invalid.
    fn from_env() -> Self {
        Self::parse(&env::var("SEARCH_CONNECTION_MODE").unwrap_or_else(|_| "retry".to_string()))
    }

    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!(value = %value, "Invalid SEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// Listing ingestion and lead capture.
    pub ingest: Arc<IngestService>,
    /// Queries against the search mirror.
    pub search: Arc<SearchIndexService>,
    /// Synchronous mirror rebuilds.
    pub mirror: Arc<IndexMirrorBuilder>,
    /// The active vertical.
    pub vertical: Arc<VerticalConfig>,
    /// The background reindex worker task.
    pub reindex_task: JoinHandle<()>,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DATABASE_URL`: Postgres connection string (required)
    /// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
    /// - `TYPESENSE_HOST`, `TYPESENSE_API_KEY`, `TYPESENSE_PROTOCOL`, `TYPESENSE_PORT`:
    ///   search engine location and credentials
    /// - `SEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `SEARCH_RETRY_INTERVAL_SECS`: retry interval in seconds (default: 15)
    /// - `MAPBOX_TOKEN`: geocoder token (optional)
    /// - `VERTICAL`: vertical id (default: medspa)
    /// - `REINDEX_CHUNK_SIZE`: documents per import request (default: 250)
    /// - `REINDEX_PAGE_SIZE`: listings read per page (default: 500)
    /// - `REINDEX_MAX_RETRIES`: retries per failed sweep (default: 3)
    /// - `REINDEX_INTERVAL_SECS`: periodic sweep interval, 0 disables (default: 0)
    ///
    /// Must be called from within a Tokio runtime; the reindex worker is
    /// spawned here.
    pub async fn new() -> Result<Self, IndexingError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| IndexingError::config("DATABASE_URL must be set"))?;
        let max_connections = env_or("DATABASE_MAX_CONNECTIONS", DEFAULT_DATABASE_MAX_CONNECTIONS);
        let connection_mode = ConnectionMode::from_env();
        let retry_interval = env_or("SEARCH_RETRY_INTERVAL_SECS", DEFAULT_RETRY_INTERVAL_SECS);

        let vertical_id = env::var("VERTICAL").unwrap_or_else(|_| DEFAULT_VERTICAL.to_string());
        if VerticalConfig::by_id(&vertical_id).is_none() {
            warn!(vertical = %vertical_id, "Unknown VERTICAL, falling back to default");
        }
        let vertical = Arc::new(VerticalConfig::resolve(&vertical_id));

        info!(
            vertical = %vertical.id,
            directory = %vertical.name,
            connection_mode = ?connection_mode,
            retry_interval_secs = retry_interval,
            max_connections,
            "Initializing dependencies"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(&database_url)
            .await
            .map_err(|e| IndexingError::config(format!("Failed to connect to database: {}", e)))?;
        run_migrations(&pool)
            .await
            .map_err(|e| IndexingError::config(format!("Failed to run migrations: {}", e)))?;

        info!("Database connection established");

        let listings: Arc<dyn ListingRepository> =
            Arc::new(PostgresListingRepository::new(pool.clone()));
        let leads: Arc<dyn LeadRepository> = Arc::new(PostgresLeadRepository::new(pool));

        let typesense = TypesenseConfig::from_env()
            .map_err(|e| IndexingError::config(format!("Invalid search configuration: {}", e)))?;
        let search_config = SearchIndexServiceConfig::with_import_chunk_size(env_or(
            "REINDEX_CHUNK_SIZE",
            SearchIndexServiceConfig::default().import_chunk_size,
        ));
        let search = Arc::new(
            Self::connect_to_search(
                typesense,
                search_config,
                connection_mode,
                Duration::from_secs(retry_interval),
            )
            .await?,
        );

        info!("Search engine connection established");

        let geocoder = MapboxGeocoder::from_env()
            .map_err(|e| IndexingError::config(format!("Failed to create geocoder: {}", e)))?;
        if !geocoder.is_enabled() {
            warn!("MAPBOX_TOKEN not set, listings without coordinates will not be geocoded");
        }
        let geocoder: Arc<dyn Geocoder> = Arc::new(geocoder);

        let mirror = Arc::new(IndexMirrorBuilder::with_page_size(
            listings.clone(),
            search.clone(),
            env_or("REINDEX_PAGE_SIZE", DEFAULT_REINDEX_PAGE_SIZE),
        ));

        let interval_secs: u64 = env_or("REINDEX_INTERVAL_SECS", 0);
        let reindex_config = ReindexConfig {
            max_retries: env_or("REINDEX_MAX_RETRIES", ReindexConfig::default().max_retries),
            interval: (interval_secs > 0).then(|| Duration::from_secs(interval_secs)),
            ..ReindexConfig::default()
        };
        let (reindex, reindex_task) = ReindexWorker::spawn(mirror.clone(), reindex_config);

        let ingest = Arc::new(IngestService::new(
            listings,
            leads,
            ListingNormalizer::new(geocoder, vertical.clone()),
            Some(reindex),
            vertical.clone(),
        ));

        Ok(Self {
            ingest,
            search,
            mirror,
            vertical,
            reindex_task,
        })
    }

    /// Connect to the search engine with retry logic based on connection mode.
    ///
    /// A connection counts as established once the listings collection exists.
    async fn connect_to_search(
        config: TypesenseConfig,
        service_config: SearchIndexServiceConfig,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<SearchIndexService, IndexingError> {
        let base_url = config.base_url();
        loop {
            match Self::try_connect_search(config.clone(), service_config.clone()).await {
                Ok(service) => return Ok(service),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(IndexingError::config(format!(
                            "Failed to connect to search engine: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            search_url = %base_url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to search engine, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }

    async fn try_connect_search(
        config: TypesenseConfig,
        service_config: SearchIndexServiceConfig,
    ) -> Result<SearchIndexService, IndexingError> {
        let provider = TypesenseProvider::new(config)
            .map_err(|e| IndexingError::config(format!("Failed to create search provider: {}", e)))?;
        let service = SearchIndexService::with_config(Box::new(provider), service_config);
        service
            .ensure_collection()
            .await
            .map_err(|e| IndexingError::config(format!("Failed to ensure collection: {}", e)))?;
        Ok(service)
    }
}
