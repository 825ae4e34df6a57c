//! Storyloom generation gateways.
//!
//! Infrastructure implementations of `GenerationGateway`: one that talks to
//! the Google Generative Language REST API directly, and one that goes through
//! the Storyloom backend's `/api/generate` endpoint.

pub mod error;
pub mod gemini;
pub mod proxy;

pub use error::GatewayError;
pub use gemini::{GeminiConfig, GeminiGateway};
pub use proxy::ProxyGateway;
