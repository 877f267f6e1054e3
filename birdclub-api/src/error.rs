//! Error types for birdclub-api

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::FeedError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Upstream feed not configured (503)
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Upstream feed failed (502)
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl From<birdclub_common::Error> for ApiError {
    fn from(err: birdclub_common::Error) -> Self {
        match err {
            birdclub_common::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            birdclub_common::Error::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::InvalidQuery(msg) => ApiError::BadRequest(msg),
            FeedError::NotConfigured(feed) => {
                ApiError::Unavailable(format!("{} feed is not configured", feed))
            }
            FeedError::Snapshot(inner) => ApiError::Internal(inner.to_string()),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "FEED_UNAVAILABLE", msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
