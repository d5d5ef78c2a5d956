//! Directory Indexer Main Entry Point
//!
//! Seeds the vertical's category taxonomy and runs one full rebuild of the
//! search mirror from the relational store.

use directory_indexer::{Dependencies, IndexingError};
use dotenv::dotenv;
use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("directory_indexer=info,search_index_repository=info,directory_repository=info")
    });

    let json = env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();
    }

    info!(
        service_name = "directory-indexer",
        service_version = env!("CARGO_PKG_VERSION"),
        json,
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    dotenv().ok();
    init_tracing();

    info!("Starting directory reindex");

    let deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    deps.ingest.seed_categories().await.map_err(|e| {
        error!(error = %e, "Failed to seed categories");
        IndexingError::from(e)
    })?;

    match deps.mirror.rebuild().await {
        Ok(report) => {
            info!(
                listings_seen = report.listings_seen,
                documents_imported = report.documents_imported,
                documents_failed = report.documents_failed,
                "Reindex completed"
            );
            deps.reindex_task.abort();
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Reindex failed");
            Err(e.into())
        }
    }
}
