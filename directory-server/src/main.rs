use directory_indexer::Dependencies;
use directory_server::{
    config::ServerConfig,
    server::{self, state::AppState},
};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("directory_server=info,directory_indexer=info,search_index_repository=info")
    });

    if env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
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
}

#[tokio::main]
async fn main() {
    // Initialize environment and logging
    dotenv::dotenv().ok();
    init_tracing();

    info!(
        service_name = "directory-server",
        service_version = env!("CARGO_PKG_VERSION"),
        "Starting directory server"
    );

    let config = ServerConfig::from_env();

    let deps = match Dependencies::new().await {
        Ok(deps) => deps,
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            std::process::exit(1);
        }
    };

    if let Err(e) = deps.ingest.seed_categories().await {
        error!(error = %e, "Failed to seed categories");
        std::process::exit(1);
    }

    let app = server::create_app(AppState::from_dependencies(&deps), &config.cors_origins);

    if let Err(e) = server::run_server(app, config.addr()).await {
        error!(error = ?e, "Server error");
        std::process::exit(1);
    }

    deps.reindex_task.abort();
}
