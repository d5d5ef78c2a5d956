// Server module - HTTP server setup and routing
pub mod handlers;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tracing::info;

use self::state::AppState;
use crate::config::create_cors_layer;

/// Create the Axum application router with all routes and middleware
pub fn create_app(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/api/ingest", post(handlers::ingest_handler))
        .route("/api/lead", post(handlers::lead_handler))
        .route("/api/search", get(handlers::search_handler))
        .route("/api/reindex", post(handlers::reindex_handler))
        .route("/health", get(handlers::health_check))
        .layer(create_cors_layer(cors_origins))
        .with_state(state)
}

/// Run the server on the specified address until Ctrl-C
pub async fn run_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    info!("Server listening on {}", addr);
    info!("- Ingest endpoint: http://{}/api/ingest", addr);
    info!("- Lead endpoint: http://{}/api/lead", addr);
    info!("- Search endpoint: http://{}/api/search", addr);
    info!("- Health endpoint: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
