//! Storyloom API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use storyloom_core::error::StoryError;
use thiserror::Error;

/// Message returned to clients whenever the upstream generation fails.
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate story";

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),

    /// The tracing or OpenTelemetry pipeline could not be installed.
    #[error("telemetry error: {0}")]
    Telemetry(String),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer error that implements `IntoResponse`.
#[derive(Debug)]
pub enum ApiError {
    /// The request body was well-formed JSON but semantically invalid.
    Validation(String),
    /// A failure reported by the story layer or the gateway.
    Story(StoryError),
}

impl From<StoryError> for ApiError {
    fn from(err: StoryError) -> Self {
        Self::Story(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            Self::Validation(message) => (StatusCode::BAD_REQUEST, "validation_error", message),
            Self::Story(err) => match err {
                StoryError::GenerationFailed(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "generation_failed",
                    GENERATION_FAILED_MESSAGE.to_owned(),
                ),
                StoryError::InvalidSequence(_) | StoryError::MissingSetupParameters { .. } => {
                    (StatusCode::BAD_REQUEST, "validation_error", err.to_string())
                }
                StoryError::NothingToUndo
                | StoryError::GenerationInFlight
                | StoryError::StoryEnded
                | StoryError::NotStarted => (StatusCode::CONFLICT, "invalid_state", err.to_string()),
            },
        };

        let body = ErrorBody {
            error: error_code,
            message,
        };

        (status, Json(body)).into_response()
    }
}
