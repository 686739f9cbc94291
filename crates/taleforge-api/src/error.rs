//! Taleforge API: error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use taleforge_core::error::DomainError;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The HTTP client for the agent service could not be built.
    #[error("agent client error: {0}")]
    AgentClient(#[from] reqwest::Error),

    /// Tracing or exporter setup failed.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DomainError::GameNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::StateConsistency(_) => StatusCode::CONFLICT,
            DomainError::Agent(_) => StatusCode::BAD_GATEWAY,
            DomainError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Client errors describe the request; server-side detail stays in the logs.
        let message = if status.is_client_error() && status != StatusCode::CONFLICT {
            self.0.to_string()
        } else {
            self.0.public_message().to_owned()
        };

        let body = ErrorBody {
            error: self.0.code(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
