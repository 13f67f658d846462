//! Error types for carlot-media
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::storage::StorageError;

/// Application-wide error type
///
/// This enum represents all possible errors that can occur
/// in the application. It implements `IntoResponse` to
/// automatically convert errors to appropriate HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Validation error (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Object storage error (status depends on the kind)
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// HTTP status, client-facing message and metric label for this error
    fn parts(&self) -> (StatusCode, String, &'static str) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), "validation"),
            AppError::Storage(err) => match err {
                StorageError::Config(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    err.to_string(),
                    "storage_config",
                ),
                StorageError::InvalidPayload(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string(), "storage_payload")
                }
                StorageError::Upload(_) => {
                    (StatusCode::BAD_GATEWAY, err.to_string(), "storage_upload")
                }
                StorageError::Delete(_) => {
                    (StatusCode::BAD_GATEWAY, err.to_string(), "storage_delete")
                }
            },
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), "config"),
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and JSON error body.
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, error_message, error_type) = self.parts();

        if status.is_server_error() {
            tracing::error!(error = %self, error_type, "Request failed");
        }

        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[error_type]).inc();

        let body = Json(serde_json::json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
