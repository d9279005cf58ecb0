use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use crate::llm::types::{LlmError, Role, Turn};
use crate::routes::app;
use crate::services::relay::{CODE_INSTRUCTION, RATE_LIMIT_MESSAGE};
use crate::state::test_helpers::{RecordingLlm, TEST_TOKEN, test_app_state_unconfigured, test_app_state_with_llm};

fn post(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn history_body() -> String {
    json!({ "messages": [{ "role": "user", "content": "hi" }] }).to_string()
}

// =============================================================================
// /api/conversation
// =============================================================================

#[tokio::test]
async fn conversation_returns_single_assistant_turn() {
    let llm = Arc::new(RecordingLlm::with_replies(vec![Ok(Turn::assistant("hello there"))]));
    let app = app(test_app_state_with_llm(llm.clone()));

    let response = app
        .oneshot(post("/api/conversation", Some(TEST_TOKEN), &history_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body, json!({ "role": "assistant", "content": "hello there" }));
    assert_eq!(llm.calls.lock().unwrap().clone(), vec![vec![Turn::user("hi")]]);
}

#[tokio::test]
async fn conversation_without_identity_is_401_before_provider() {
    let llm = Arc::new(RecordingLlm::default());
    let app = app(test_app_state_with_llm(llm.clone()));

    let response = app
        .oneshot(post("/api/conversation", None, &history_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(response).await, "Unauthorized");
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn conversation_with_unknown_token_is_401() {
    let llm = Arc::new(RecordingLlm::default());
    let app = app(test_app_state_with_llm(llm.clone()));

    let response = app
        .oneshot(post("/api/conversation", Some("forged"), &history_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn unauthenticated_malformed_body_is_still_401() {
    let app = app(test_app_state_unconfigured());

    let response = app.oneshot(post("/api/conversation", None, "{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_messages_are_400_and_never_reach_provider() {
    for body in [
        json!({}).to_string(),
        json!({ "messages": [] }).to_string(),
        json!({ "messages": "hi" }).to_string(),
        json!({ "messages": [{ "role": "user" }] }).to_string(),
        "{not json".to_owned(),
    ] {
        let llm = Arc::new(RecordingLlm::default());
        let app = app(test_app_state_with_llm(llm.clone()));

        let response = app
            .oneshot(post("/api/conversation", Some(TEST_TOKEN), &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(body_string(response).await, "Messages are required");
        assert_eq!(llm.call_count(), 0);
    }
}

#[tokio::test]
async fn missing_credential_is_500() {
    let app = app(test_app_state_unconfigured());

    let response = app
        .oneshot(post("/api/conversation", Some(TEST_TOKEN), &history_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, "OpenAI API Key not configured");
}

#[tokio::test]
async fn quota_exhaustion_is_429_with_fixed_message() {
    let llm = Arc::new(RecordingLlm::with_replies(vec![Err(LlmError::RateLimited {
        status: 429,
        body: json!({ "error": { "code": "insufficient_quota" } }).to_string(),
    })]));
    let app = app(test_app_state_with_llm(llm));

    let response = app
        .oneshot(post("/api/conversation", Some(TEST_TOKEN), &history_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_string(response).await, RATE_LIMIT_MESSAGE);
}

#[tokio::test]
async fn other_upstream_failure_is_generic_500() {
    let llm = Arc::new(RecordingLlm::with_replies(vec![Err(LlmError::ApiResponse {
        status: 503,
        body: "upstream detail".into(),
    })]));
    let app = app(test_app_state_with_llm(llm.clone()));

    let response = app
        .oneshot(post("/api/conversation", Some(TEST_TOKEN), &history_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, "Internal Server Error");
    assert_eq!(llm.call_count(), 1);
}

// =============================================================================
// /api/code
// =============================================================================

#[tokio::test]
async fn code_prepends_system_turn_server_side() {
    let llm = Arc::new(RecordingLlm::with_replies(vec![Ok(Turn::assistant(
        "```python\n# prints a greeting\nprint(\"Hello, world!\")\n```",
    ))]));
    let app = app(test_app_state_with_llm(llm.clone()));
    let body = json!({ "messages": [{ "role": "user", "content": "Write a hello world in Python" }] }).to_string();

    let response = app.oneshot(post("/api/code", Some(TEST_TOKEN), &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let reply: Turn = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(reply.role, Role::Assistant);
    assert!(reply.display_text().starts_with("```python"));

    let calls = llm.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0][0], Turn::system(CODE_INSTRUCTION));
    assert_eq!(calls[0][1], Turn::user("Write a hello world in Python"));
}

#[tokio::test]
async fn code_accepts_session_cookie() {
    let llm = Arc::new(RecordingLlm::default());
    let app = app(test_app_state_with_llm(llm));
    let request = Request::builder()
        .method("POST")
        .uri("/api/code")
        .header("cookie", format!("__session={TEST_TOKEN}"))
        .body(Body::from(history_body()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// /api/image
// =============================================================================

#[tokio::test]
async fn image_returns_urls() {
    let llm = Arc::new(RecordingLlm::default());
    let app = app(test_app_state_with_llm(llm.clone()));
    let body = json!({ "prompt": "a horse in space", "amount": "2", "resolution": "256x256" }).to_string();

    let response = app.oneshot(post("/api/image", Some(TEST_TOKEN), &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let images: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(images.as_array().map(Vec::len), Some(2));
    assert!(images[0]["url"].as_str().is_some());
    assert_eq!(llm.image_calls.lock().unwrap()[0].resolution, "256x256");
}

#[tokio::test]
async fn image_rejects_bad_amount() {
    let llm = Arc::new(RecordingLlm::default());
    let app = app(test_app_state_with_llm(llm.clone()));
    let body = json!({ "prompt": "p", "amount": "9" }).to_string();

    let response = app.oneshot(post("/api/image", Some(TEST_TOKEN), &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("between 1 and 5"));
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn image_requires_identity() {
    let app = app(test_app_state_unconfigured());
    let body = json!({ "prompt": "p" }).to_string();

    let response = app.oneshot(post("/api/image", None, &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// catalog + placeholders
// =============================================================================

#[tokio::test]
async fn tools_lists_catalog() {
    let app = app(test_app_state_unconfigured());
    let request = Request::builder().uri("/api/tools").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let tools: Value = serde_json::from_str(&body_string(response).await).unwrap();
    let keys: Vec<&str> = tools
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["key"].as_str())
        .collect();
    assert_eq!(keys, vec!["conversation", "image", "video", "music", "code"]);
}

#[tokio::test]
async fn video_placeholder_is_501_for_known_caller() {
    let app = app(test_app_state_unconfigured());

    let response = app.oneshot(post("/api/video", Some(TEST_TOKEN), "{}")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body_string(response).await, "Video Generation is not available yet");
}

#[tokio::test]
async fn music_placeholder_requires_identity() {
    let app = app(test_app_state_unconfigured());

    let response = app.oneshot(post("/api/music", None, "{}")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn healthz_is_ok() {
    let app = app(test_app_state_unconfigured());
    let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
