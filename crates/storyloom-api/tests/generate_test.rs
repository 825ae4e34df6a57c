//! Integration tests for the generate endpoint.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use storyloom_test_support::{FailingGateway, ScriptedGateway};

#[tokio::test]
async fn test_generate_round_trip_through_full_stack() {
    // Arrange
    let gateway = Arc::new(ScriptedGateway::replying(&[
        "The Gate\n\nA gate looms.\n\nA) Enter\nB) Leave\nC) Wait\nD) Shout",
    ]));
    let app = common::build_test_app(gateway.clone());

    // Act
    let (status, json) = common::post_json(
        app,
        "/api/generate",
        &json!({ "prompt": "Begin a fantasy story", "history": [] }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert!(json["story"].as_str().unwrap().starts_with("The Gate"));
    assert_eq!(gateway.requests()[0].prompt, "Begin a fantasy story");
}

#[tokio::test]
async fn test_generate_failure_returns_500_body() {
    let app = common::build_test_app(Arc::new(FailingGateway));

    let (status, json) =
        common::post_json(app, "/api/generate", &json!({ "prompt": "Begin" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json,
        json!({ "error": "generation_failed", "message": "Failed to generate story" })
    );
}

#[tokio::test]
async fn test_odd_length_history_returns_400() {
    // Arrange
    let gateway = Arc::new(ScriptedGateway::replying(&["unused"]));
    let app = common::build_test_app(gateway.clone());
    let body = json!({
        "prompt": "continue",
        "history": [{ "role": "user", "content": "begin" }]
    });

    // Act
    let (status, json) = common::post_json(app, "/api/generate", &body).await;

    // Assert
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
    assert!(gateway.requests().is_empty());
}

#[tokio::test]
async fn test_get_on_generate_is_method_not_allowed() {
    let app = common::build_test_app(Arc::new(FailingGateway));

    let (status, _) = common::get_json(app, "/api/generate").await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
