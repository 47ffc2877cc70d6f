//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::postal::LookupError;
use crate::services::ClientError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Client operation failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Client(err) => match err.unshared() {
                ClientError::NotFound(_) => StatusCode::NOT_FOUND,
                ClientError::InvalidPostalCode(_) => StatusCode::BAD_REQUEST,
                ClientError::AddressLookupFailed(LookupError::NotFound(_)) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                ClientError::AddressLookupFailed(_) => StatusCode::BAD_GATEWAY,
                ClientError::PersistenceFailed(_) | ClientError::Shared(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message shown to the caller. Server-side details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            Self::Client(err) => match err.unshared() {
                ClientError::AddressLookupFailed(LookupError::NotFound(code)) => {
                    format!("Unknown postal code: {code}")
                }
                ClientError::AddressLookupFailed(_) => "Postal lookup service error".to_string(),
                ClientError::PersistenceFailed(_) | ClientError::Shared(_) => {
                    "Internal server error".to_string()
                }
                other => other.to_string(),
            },
            Self::BadRequest(_) => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, self.public_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
