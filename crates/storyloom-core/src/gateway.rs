//! Generation gateway abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoryError;
use crate::turn::Turn;

/// A prompt plus the conversation that precedes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The new prompt.
    pub prompt: String,
    /// Earlier turns in chronological order.
    #[serde(default)]
    pub history: Vec<Turn>,
}

impl GenerationRequest {
    /// Creates a request for `prompt` following `history`.
    #[must_use]
    pub fn new(prompt: impl Into<String>, history: Vec<Turn>) -> Self {
        Self {
            prompt: prompt.into(),
            history,
        }
    }
}

/// Successful generation payload as exchanged with the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// The generated narrative text.
    pub story: String,
}

/// External service that turns a prompt and history into narrative text.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Generate the next piece of story text.
    ///
    /// Implementations must resolve every failure (transport error,
    /// non-success status, missing or empty text) as
    /// `StoryError::GenerationFailed` rather than leaving the call pending.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, StoryError>;
}
