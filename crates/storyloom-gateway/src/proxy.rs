//! Client for the Storyloom backend's `/api/generate` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use storyloom_core::error::StoryError;
use storyloom_core::gateway::{GenerationGateway, GenerationRequest};
use tracing::instrument;

use crate::error::GatewayError;

/// Backend reply. `story` is optional so a success without it can be told
/// apart from undecodable JSON.
#[derive(Debug, Deserialize)]
struct ProxyReply {
    #[serde(default)]
    story: Option<String>,
}

/// Gateway that forwards prompt and history to a Storyloom backend.
#[derive(Debug, Clone)]
pub struct ProxyGateway {
    http: HttpClient,
    base: String,
}

impl ProxyGateway {
    /// Builds a gateway for the backend at `base_url` with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Config` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;
        Ok(Self::with_http(base_url, http))
    }

    /// Builds a gateway around a caller-supplied HTTP client.
    #[must_use]
    pub fn with_http(base_url: impl Into<String>, http: HttpClient) -> Self {
        Self {
            http,
            base: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Posts `request` to the backend and returns the story text.
    ///
    /// Any non-success status and any success payload lacking `story` are
    /// reported the same way, as a gateway error.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failure, non-success status,
    /// undecodable body, or a missing or empty `story` field.
    #[instrument(skip(self, request), fields(base = %self.base, history_len = request.history.len()))]
    pub async fn generate_text(&self, request: &GenerationRequest) -> Result<String, GatewayError> {
        let resp = self
            .http
            .post(format!("{}/api/generate", self.base))
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Api { status, body });
        }

        let bytes = resp.bytes().await?;
        let reply: ProxyReply = serde_json::from_slice(&bytes)?;
        reply
            .story
            .filter(|story| !story.trim().is_empty())
            .ok_or_else(|| GatewayError::MissingText("payload has no story field".to_owned()))
    }
}

#[async_trait]
impl GenerationGateway for ProxyGateway {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, StoryError> {
        Ok(self.generate_text(request).await?)
    }
}
