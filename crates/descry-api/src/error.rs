//! API error type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Errors returned by handlers, rendered as `{"error": message}`.
#[derive(Debug)]
pub enum ApiError {
    Store(descry_core::Error),
    Unprocessable(String),
}

impl From<descry_core::Error> for ApiError {
    fn from(err: descry_core::Error) -> Self {
        match err {
            descry_core::Error::InvalidInput(msg) => ApiError::Unprocessable(msg),
            other => ApiError::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Store(err) => {
                tracing::error!(subsystem = "api", error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
