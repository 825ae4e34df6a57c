//! Integration tests for `ProxyGateway` against a fake backend.

mod common;

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use storyloom_core::error::StoryError;
use storyloom_core::gateway::{GenerationGateway, GenerationRequest};
use storyloom_core::turn::Turn;
use storyloom_gateway::ProxyGateway;

use common::Captured;

async fn fake_backend(
    State(captured): State<Captured>,
    Json(body): Json<Value>,
) -> Json<Value> {
    captured
        .lock()
        .unwrap()
        .push(("/api/generate".to_owned(), None, body));
    Json(json!({ "story": "You step through the gate." }))
}

async fn fake_backend_failure() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "generation_failed", "message": "Failed to generate story" })),
    )
}

async fn fake_backend_without_story() -> Json<Value> {
    Json(json!({ "text": "wrong field" }))
}

fn gateway_for(base: &str) -> ProxyGateway {
    ProxyGateway::new(base, Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_generate_forwards_prompt_and_history() {
    // Arrange
    let captured = Captured::default();
    let app = Router::new()
        .route("/api/generate", post(fake_backend))
        .with_state(captured.clone());
    let base = common::spawn_upstream(app).await;
    let request = GenerationRequest::new(
        "go on",
        vec![Turn::user("begin"), Turn::model("A gate.")],
    );

    // Act
    let story = gateway_for(&format!("{base}/")).generate(&request).await;

    // Assert
    assert_eq!(story, Ok("You step through the gate.".to_owned()));
    let seen = captured.lock().unwrap();
    let body = &seen[0].2;
    assert_eq!(body["prompt"], "go on");
    assert_eq!(
        body["history"],
        json!([
            { "role": "user", "content": "begin" },
            { "role": "model", "content": "A gate." },
        ])
    );
}

#[tokio::test]
async fn test_backend_error_status_is_generation_failed() {
    let app = Router::new().route("/api/generate", post(fake_backend_failure));
    let base = common::spawn_upstream(app).await;

    let result = gateway_for(&base)
        .generate(&GenerationRequest::new("begin", vec![]))
        .await;

    match result {
        Err(StoryError::GenerationFailed(message)) => assert!(message.contains("500")),
        other => panic!("expected GenerationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_success_without_story_field_is_generation_failed() {
    let app = Router::new().route("/api/generate", post(fake_backend_without_story));
    let base = common::spawn_upstream(app).await;

    let result = gateway_for(&base)
        .generate(&GenerationRequest::new("begin", vec![]))
        .await;

    assert!(matches!(result, Err(StoryError::GenerationFailed(_))));
}

#[tokio::test]
async fn test_unreachable_backend_is_generation_failed() {
    let base = common::closed_port().await;

    let result = gateway_for(&base)
        .generate(&GenerationRequest::new("begin", vec![]))
        .await;

    assert!(matches!(result, Err(StoryError::GenerationFailed(_))));
}
