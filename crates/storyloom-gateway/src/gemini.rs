//! Google Gemini `generateContent` gateway.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use storyloom_core::error::StoryError;
use storyloom_core::gateway::{GenerationGateway, GenerationRequest};
use storyloom_core::turn::Turn;
use tracing::{debug, instrument};

use crate::error::GatewayError;

/// Default REST endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.8;
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for `GeminiGateway`.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key sent in the `x-goog-api-key` header.
    pub api_key: String,
    /// Model name, e.g. `gemini-1.5-flash`.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Endpoint root without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Settings with the default model, temperature, endpoint and timeout.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_owned(),
            temperature: DEFAULT_TEMPERATURE,
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use a different model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a different temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Use a different endpoint root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Use a different timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

impl<'a> GenerateContentRequest<'a> {
    fn build(request: &'a GenerationRequest, temperature: f32) -> Self {
        let history = request.history.iter().map(|turn: &'a Turn| Content {
            role: turn.role.as_str(),
            parts: vec![Part {
                text: &turn.content,
            }],
        });
        let prompt = Content {
            role: "user",
            parts: vec![Part {
                text: &request.prompt,
            }],
        };

        Self {
            contents: history.chain(std::iter::once(prompt)).collect(),
            generation_config: GenerationConfig { temperature },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Result<String, GatewayError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(GatewayError::MissingText(match block_reason {
                Some(reason) => format!("prompt blocked: {reason}"),
                None => "no candidates".to_owned(),
            }));
        };

        let text: String = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        if text.trim().is_empty() {
            return Err(GatewayError::MissingText(format!(
                "empty candidate, finish reason {}",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(text)
    }
}

/// Gateway calling Gemini's `models/{model}:generateContent` endpoint.
///
/// Shares a single `reqwest::Client`, so cloning is cheap.
#[derive(Debug, Clone)]
pub struct GeminiGateway {
    config: GeminiConfig,
    http: HttpClient,
}

impl GeminiGateway {
    /// Builds a gateway with its own HTTP client honouring `config.timeout`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Config` if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self, GatewayError> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;
        Ok(Self::with_http(config, http))
    }

    /// Builds a gateway around a caller-supplied HTTP client.
    #[must_use]
    pub fn with_http(config: GeminiConfig, http: HttpClient) -> Self {
        Self { config, http }
    }

    /// Sends `request` and returns the concatenated candidate text.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failure, non-success status,
    /// undecodable body, or a payload without text.
    #[instrument(skip(self, request), fields(model = %self.config.model, history_len = request.history.len()))]
    pub async fn generate_text(&self, request: &GenerationRequest) -> Result<String, GatewayError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let body = GenerateContentRequest::build(request, self.config.temperature);

        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Api { status, body });
        }

        let bytes = resp.bytes().await?;
        let parsed: GenerateContentResponse = serde_json::from_slice(&bytes)?;
        let text = parsed.into_text()?;
        debug!(chars = text.len(), "gemini generation complete");
        Ok(text)
    }
}

#[async_trait]
impl GenerationGateway for GeminiGateway {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, StoryError> {
        Ok(self.generate_text(request).await?)
    }
}
