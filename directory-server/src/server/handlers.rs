// HTTP request handlers
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use directory_indexer::{IngestOutcome, ReindexReport};
use directory_shared::{IngestPayload, LeadInput, SearchResponse};
use tracing::{debug, info};

use crate::errors::ApiError;
use crate::models::{ApiResponse, Health, LeadCreated, SearchParams};
use crate::server::state::AppState;

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Submitting client address: the first `x-forwarded-for` entry, else `x-real-ip`.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header("x-real-ip"))
        .map(str::to_string)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<Health>> {
    Json(ApiResponse::ok(Health {
        status: "ok",
        vertical: state.vertical.id.clone(),
    }))
}

/// Ingest a batch of listings.
pub async fn ingest_handler(
    State(state): State<AppState>,
    payload: Result<Json<IngestPayload>, JsonRejection>,
) -> ApiResult<IngestOutcome> {
    let Json(payload) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    info!(
        listings = payload.listings.len(),
        reindex = payload.reindex,
        "Received ingest request"
    );

    let outcome = state.ingest.ingest(payload).await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

/// Record a lead.
pub async fn lead_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<LeadInput>, JsonRejection>,
) -> ApiResult<LeadCreated> {
    let Json(input) = payload.map_err(|e| ApiError::validation(e.body_text()))?;

    let id = state.ingest.capture_lead(input, client_ip(&headers)).await?;
    Ok(Json(ApiResponse::ok(LeadCreated { id })))
}

/// Query the directory.
pub async fn search_handler(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<SearchResponse> {
    let Query(params) = params.map_err(|e| ApiError::validation(e.body_text()))?;
    let query = params.into_query();
    debug!(?query, "Search request");

    let response = state.search.search_listings(&query).await?;
    Ok(Json(ApiResponse::ok(response)))
}

/// Rebuild the search mirror synchronously.
pub async fn reindex_handler(State(state): State<AppState>) -> ApiResult<ReindexReport> {
    info!("Manual reindex requested");
    let report = state.mirror.rebuild().await?;
    Ok(Json(ApiResponse::ok(report)))
}
