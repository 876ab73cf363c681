//! API error types with IntoResponse
//!
//! Every failure a handler can see ends here as a JSON response; none of
//! them escape to the event loop.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::PersistenceError;
use crate::models::ClientInputError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Malformed identifier or body (400)
    Input(ClientInputError),

    /// Store failure (503 if transient, 500 if permanent)
    Persistence(PersistenceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Input(e) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "invalid_input",
                    "message": e.to_string()
                }),
            ),
            Self::Persistence(e) if e.is_retryable() => {
                tracing::warn!(error = %e, "transient store failure");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({
                        "error": "store_unavailable",
                        "message": "the store is temporarily unavailable"
                    }),
                )
            }
            Self::Persistence(e) => {
                // Log the actual error, return generic message
                tracing::error!(error = %e, "store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ClientInputError> for ApiError {
    fn from(e: ClientInputError) -> Self {
        Self::Input(e)
    }
}

impl From<PersistenceError> for ApiError {
    fn from(e: PersistenceError) -> Self {
        Self::Persistence(e)
    }
}
