// HTTP error mapping
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use directory_indexer::{ErrorKind, IngestError};
use search_index_repository::SearchIndexError;
use tracing::{error, warn};

use crate::models::ApiErrorBody;

/// An error rendered in the `{ok: false, error, kind}` envelope.
#[derive(Debug)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: message.into(),
        }
    }

    /// Every failure answers with a client-error status; `kind` tells them apart.
    pub fn status(&self) -> StatusCode {
        match self.kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Persistence => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Downstream => StatusCode::FAILED_DEPENDENCY,
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<SearchIndexError> for ApiError {
    fn from(err: SearchIndexError) -> Self {
        IngestError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self.kind {
            ErrorKind::Validation => warn!(error = %self.message, "Request rejected"),
            _ => error!(kind = ?self.kind, error = %self.message, "Request failed"),
        }

        (
            status,
            Json(ApiErrorBody {
                ok: false,
                error: self.message,
                kind: self.kind,
            }),
        )
            .into_response()
    }
}
