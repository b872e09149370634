use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use barcode::BarcodeError;
use cache::{CacheError, ResolveError};

pub type ServerResult<T> = Result<T, ServerError>;

/// Page returned, with status 200, whenever a document cannot be delivered.
pub const DOCUMENT_NOT_FOUND_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en"><head></head>
<body><p>Impossible de lire l'attestation vétérinaire. Non Trouvé</p></body>"#;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Barcode error: {0}")]
    Barcode(#[from] BarcodeError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) | ServerError::Resolve(ResolveError::EmptyKey) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::NotFound => StatusCode::NOT_FOUND,
            // Absence and archive outages are both answered with the soft page.
            ServerError::Resolve(_) => StatusCode::OK,
            ServerError::Barcode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Cache(_) | ServerError::Internal(_) | ServerError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get error code string
    fn error_code(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) | ServerError::Resolve(ResolveError::EmptyKey) => {
                "BAD_REQUEST"
            }
            ServerError::NotFound => "NOT_FOUND",
            ServerError::Resolve(_) => "DOCUMENT_NOT_FOUND",
            ServerError::Barcode(_) => "BARCODE_ERROR",
            ServerError::Cache(_) => "CACHE_ERROR",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// True when the client gets the not-found page instead of a JSON error.
    fn is_soft_miss(&self) -> bool {
        matches!(self, ServerError::Resolve(err) if !matches!(err, ResolveError::EmptyKey))
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.is_soft_miss() {
            tracing::info!(error = %self, "document_not_delivered");
            return (status, Html(DOCUMENT_NOT_FOUND_PAGE)).into_response();
        }
        if status.is_server_error() {
            tracing::error!(error = %self, "request_failed");
        }

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
        });

        (status, body).into_response()
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServerError::Internal(format!("Background task failed: {err}"))
    }
}
