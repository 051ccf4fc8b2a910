pub mod handlers;
pub mod responses;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Body returned for every error response.
///
/// ```json
/// {
///   "error": "Conflict",
///   "message": "A capture cycle is already in progress (state: streaming)",
///   "details": null
/// }
/// ```
#[derive(Debug, Serialize, serde::Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error identifier
    pub error: String,
    /// Human-readable message
    pub message: String,
    /// Optional structured details (e.g. validation field errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }
}

/// Application error type that renders as an HTTP response.
///
/// Domain crates convert their own error enums into this at the HTTP edge.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::JsonExtractorRejection(e) => e.status(),
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            AppError::JsonExtractorRejection(e) => {
                tracing::warn!("JSON extraction error: {:?}", e);
                ErrorResponse::new("BadRequest", e.body_text())
            }
            AppError::ValidationError(e) => {
                tracing::info!("Validation error: {:?}", e);
                ErrorResponse {
                    details: serde_json::to_value(&e).ok(),
                    ..ErrorResponse::new("BadRequest", "Request validation failed")
                }
            }
            AppError::BadRequest(msg) => {
                tracing::info!("Bad request: {}", msg);
                ErrorResponse::new("BadRequest", msg)
            }
            AppError::Forbidden(msg) => {
                tracing::warn!("Forbidden: {}", msg);
                ErrorResponse::new("Forbidden", msg)
            }
            AppError::Conflict(msg) => {
                tracing::info!("Conflict: {}", msg);
                ErrorResponse::new("Conflict", msg)
            }
            AppError::InternalServerError(msg) => {
                // Internal details stay in the logs
                tracing::error!("Internal server error: {}", msg);
                ErrorResponse::new("InternalServerError", "An internal server error occurred")
            }
            AppError::BadGateway(msg) => {
                tracing::error!("Upstream failure: {}", msg);
                ErrorResponse::new("BadGateway", msg)
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                ErrorResponse::new("ServiceUnavailable", msg)
            }
        };

        (status, Json(body)).into_response()
    }
}
