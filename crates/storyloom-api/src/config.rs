//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use storyloom_gateway::GeminiConfig;
use storyloom_gateway::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE};

use crate::error::AppError;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(AppError::Config(format!(
                "LOG_FORMAT must be json or pretty, got {other:?}"
            ))),
        }
    }
}

/// Everything the API binary needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind.
    pub addr: SocketAddr,
    /// Gemini connection settings.
    pub gemini: GeminiConfig,
    /// Log output format.
    pub log_format: LogFormat,
    /// OTLP collector endpoint; span export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or any
    /// value fails to parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or any
    /// value fails to parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("GEMINI_API_KEY").ok_or_else(|| {
            AppError::Config("GEMINI_API_KEY environment variable must be set".to_owned())
        })?;
        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_owned());
        let port: u16 = parse_or(get("PORT"), "PORT", 3000)?;
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;

        let temperature: f32 = parse_or(
            get("GEMINI_TEMPERATURE"),
            "GEMINI_TEMPERATURE",
            DEFAULT_TEMPERATURE,
        )?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(AppError::Config(format!(
                "GEMINI_TEMPERATURE must be between 0 and 2, got {temperature}"
            )));
        }
        let timeout_secs: u64 =
            parse_or(get("GENERATION_TIMEOUT_SECS"), "GENERATION_TIMEOUT_SECS", 60)?;
        if timeout_secs == 0 {
            return Err(AppError::Config(
                "GENERATION_TIMEOUT_SECS must be greater than zero".to_owned(),
            ));
        }

        let gemini = GeminiConfig::new(api_key)
            .with_model(get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_owned()))
            .with_temperature(temperature)
            .with_base_url(get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()))
            .with_timeout(Duration::from_secs(timeout_secs));

        let log_format = match get("LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => LogFormat::Json,
        };

        Ok(Self {
            addr,
            gemini,
            log_format,
            otlp_endpoint: get("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }
}

fn parse_or<T>(value: Option<String>, name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{name} is invalid: {e}"))),
        None => Ok(default),
    }
}
