//! Story generation endpoint.

use axum::extract::State;
use axum::{Json, Router, routing::post};
use storyloom_core::gateway::{GenerationRequest, GenerationResponse};
use storyloom_core::turn::validate_history;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/generate
///
/// Forwards the prompt and prior turns to the gateway unchanged.
#[instrument(
    skip(state, request),
    fields(correlation_id = %Uuid::new_v4(), history_len = request.history.len())
)]
async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GenerationResponse>, ApiError> {
    if request.prompt.trim().is_empty() {
        return Err(ApiError::Validation("prompt must not be blank".to_owned()));
    }
    validate_history(&request.history)?;

    info!("handling generate request");

    let story = state.gateway.generate(&request).await.inspect_err(|err| {
        error!(error = %err, "story generation failed");
    })?;

    Ok(Json(GenerationResponse { story }))
}

/// Returns the router for the generation endpoint.
pub fn router() -> Router<AppState> {
    Router::new().route("/generate", post(generate))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use storyloom_core::gateway::GenerationGateway;
    use storyloom_core::turn::Turn;
    use storyloom_test_support::{FailingGateway, ScriptedGateway};
    use tower::ServiceExt;

    fn app_with(gateway: Arc<dyn GenerationGateway>) -> Router {
        router().with_state(AppState::new(gateway))
    }

    fn post_generate(body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/generate")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body_bytes).unwrap()
    }

    #[tokio::test]
    async fn test_generate_returns_story_and_forwards_history() {
        // Arrange
        let gateway = Arc::new(ScriptedGateway::replying(&["The Gate\n\nA gate looms."]));
        let app = app_with(gateway.clone());
        let body = json!({
            "prompt": "continue",
            "history": [
                { "role": "user", "content": "begin" },
                { "role": "model", "content": "It began." }
            ]
        });

        // Act
        let response = app.oneshot(post_generate(&body)).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["story"], "The Gate\n\nA gate looms.");
        let requests = gateway.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].prompt, "continue");
        assert_eq!(
            requests[0].history,
            vec![Turn::user("begin"), Turn::model("It began.")]
        );
    }

    #[tokio::test]
    async fn test_generate_without_history_defaults_to_empty() {
        // Arrange
        let gateway = Arc::new(ScriptedGateway::replying(&["Once"]));
        let app = app_with(gateway.clone());

        // Act
        let response = app
            .oneshot(post_generate(&json!({ "prompt": "begin" })))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        assert!(gateway.requests()[0].history.is_empty());
    }

    #[tokio::test]
    async fn test_gateway_failure_returns_500_with_fixed_message() {
        // Arrange
        let app = app_with(Arc::new(FailingGateway));

        // Act
        let response = app
            .oneshot(post_generate(&json!({ "prompt": "begin", "history": [] })))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["error"], "generation_failed");
        assert_eq!(json["message"], "Failed to generate story");
    }

    #[tokio::test]
    async fn test_blank_prompt_returns_400_without_calling_gateway() {
        // Arrange
        let gateway = Arc::new(ScriptedGateway::replying(&["unused"]));
        let app = app_with(gateway.clone());

        // Act
        let response = app
            .oneshot(post_generate(&json!({ "prompt": "   " })))
            .await
            .unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "validation_error");
        assert!(gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_order_history_returns_400() {
        // Arrange
        let gateway = Arc::new(ScriptedGateway::replying(&["unused"]));
        let app = app_with(gateway.clone());
        let body = json!({
            "prompt": "continue",
            "history": [
                { "role": "model", "content": "It began." },
                { "role": "user", "content": "begin" }
            ]
        });

        // Act
        let response = app.oneshot(post_generate(&body)).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn test_missing_prompt_is_rejected() {
        let app = app_with(Arc::new(FailingGateway));

        let response = app
            .oneshot(post_generate(&json!({ "history": [] })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
