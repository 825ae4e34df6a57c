//! Storyloom backend: an axum server that forwards story prompts and
//! conversation history to the generative model.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
