//! Error types for the tunesmith-ai HTTP surface
//!
//! Generation itself never errors (failures are sentinel records); only
//! request validation reaches the client as an HTTP error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::UnknownModel;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Model id not in the supported list (400)
    #[error(transparent)]
    UnknownModel(#[from] UnknownModel),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::UnknownModel(ref err) => {
                (StatusCode::BAD_REQUEST, "UNKNOWN_MODEL", err.to_string())
            }
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
