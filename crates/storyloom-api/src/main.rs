//! Storyloom API server entry point.

use std::error::Error;
use std::sync::Arc;

use storyloom_api::config::ServerConfig;
use storyloom_api::state::AppState;
use storyloom_api::{routes, telemetry};
use storyloom_gateway::GeminiGateway;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env file is fine; real environment variables still apply.
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env()?;
    let _telemetry = telemetry::init(config.log_format, config.otlp_endpoint.as_deref())?;

    tracing::info!(model = %config.gemini.model, "Starting Storyloom API server");

    let gateway = GeminiGateway::new(config.gemini)?;
    let app_state = AppState::new(Arc::new(gateway));

    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    tracing::info!("Listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
