use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::relay::backend::BackendError;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every variant renders as `{ "error": "<message>" }`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// The backend answered with an error status; it is passed through.
    #[error("Backend error (status {status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Backend timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Timeout => AppError::Timeout,
            BackendError::Network(e) => AppError::Network(e.to_string()),
            BackendError::Encode(e) => AppError::Internal(e.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            AppError::Backend { status, message } => {
                let status = StatusCode::from_u16(*status)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                if status.is_server_error() {
                    tracing::error!("Backend error ({status}): {message}");
                } else {
                    tracing::warn!("Backend rejected upload ({status}): {message}");
                }
                (status, message.clone())
            }
            AppError::Timeout => {
                tracing::error!("Backend call timed out");
                (StatusCode::GATEWAY_TIMEOUT, "timeout".to_string())
            }
            AppError::Network(msg) => {
                tracing::error!("Network error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to reach the resume processing service".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorEnvelope { error: message })).into_response()
    }
}
