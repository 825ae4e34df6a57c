//! Gateway error types.

use reqwest::StatusCode;
use storyloom_core::error::StoryError;
use thiserror::Error;

/// Every failure mode a gateway call can hit.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport failure, including timeouts.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("couldn't decode response body: {0}")]
    Serde(#[from] serde_json::Error),

    /// The upstream answered with a non-success status.
    #[error("upstream returned non-success status {status}: {body}")]
    Api {
        /// Status code received.
        status: StatusCode,
        /// Response body, possibly empty.
        body: String,
    },

    /// A success payload carried no usable text.
    #[error("response contained no story text: {0}")]
    MissingText(String),

    /// The client could not be constructed.
    #[error("gateway configuration error: {0}")]
    Config(String),
}

impl From<GatewayError> for StoryError {
    fn from(value: GatewayError) -> Self {
        StoryError::GenerationFailed(value.to_string())
    }
}
