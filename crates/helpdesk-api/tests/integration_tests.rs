//! Integration tests for the Helpdesk API.
//!
//! Each test builds its own router over a mock backend and an in-memory
//! identity provider, and drives it with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tower::ServiceExt;

use helpdesk_api::handlers::{ChatView, HealthResponse, SubmitResponse};
use helpdesk_api::{create_router, AppState};
use helpdesk_chat::{MockBackend, StaticContext};
use helpdesk_core::config::HelpdeskConfig;
use helpdesk_core::types::Role;
use helpdesk_identity::{InMemoryIdentityProvider, SessionGate};

// =============================================================================
// Helpers
// =============================================================================

const EMAIL: &str = "student@luxdevhq.com";
const PASSWORD: &str = "correct horse";

fn make_state_with(config: HelpdeskConfig, backend: MockBackend) -> AppState {
    let provider = Arc::new(InMemoryIdentityProvider::with_user(EMAIL, PASSWORD));
    let gate = SessionGate::new(provider);
    AppState::new(
        config,
        Arc::new(backend),
        Arc::new(StaticContext::new("Programs: Data Science, Data Engineering")),
        gate,
    )
}

fn make_state(backend: MockBackend) -> AppState {
    make_state_with(HelpdeskConfig::default(), backend)
}

async fn signed_in(state: &AppState) {
    state.gate.sign_in(EMAIL, PASSWORD).await.unwrap();
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(state: &AppState, req: Request<Body>) -> (StatusCode, Value) {
    let response = create_router(state.clone()).oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

// =============================================================================
// Health and session
// =============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let state = make_state(MockBackend::new());
    let (status, body) = send(&state, get("/health")).await;
    assert_eq!(status, StatusCode::OK);

    let health: HealthResponse = serde_json::from_value(body).unwrap();
    assert_eq!(health.status, "healthy");
    assert!(!health.signed_in);
    assert_eq!(health.surfaces, vec!["assistant", "widget"]);
}

#[tokio::test]
async fn test_sign_in_success() {
    let state = make_state(MockBackend::new());
    let (status, body) = send(
        &state,
        post_json("/auth/sign-in", json!({"email": EMAIL, "password": PASSWORD})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identity"]["email"], EMAIL);
    assert!(state.gate.is_signed_in());

    let (_, session) = send(&state, get("/auth/session")).await;
    assert_eq!(session["present"], true);
}

#[tokio::test]
async fn test_sign_in_bad_credentials() {
    let state = make_state(MockBackend::new());
    let (status, body) = send(
        &state,
        post_json("/auth/sign-in", json!({"email": EMAIL, "password": "wrong"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
    assert!(!state.gate.is_signed_in());
}

#[tokio::test]
async fn test_sign_in_missing_fields() {
    let state = make_state(MockBackend::new());
    let (status, body) = send(
        &state,
        post_json("/auth/sign-in", json!({"email": "  ", "password": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

// =============================================================================
// Session gating
// =============================================================================

#[tokio::test]
async fn test_chat_requires_session() {
    let state = make_state(MockBackend::new());

    let (status, body) = send(&state, get("/chat/widget")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = send(&state, post_json("/chat/widget", json!({"text": "hi"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&state, post_empty("/auth/sign-out")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_surface() {
    let state = make_state(MockBackend::new());
    signed_in(&state).await;

    let (status, body) = send(&state, get("/chat/kiosk")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_get_chat_initial_view() {
    let state = make_state(MockBackend::new());
    signed_in(&state).await;

    let (status, body) = send(&state, get("/chat/assistant")).await;
    assert_eq!(status, StatusCode::OK);

    let view: ChatView = serde_json::from_value(body).unwrap();
    assert_eq!(view.surface, "assistant");
    assert_eq!(view.greeting, HelpdeskConfig::default().chat.greeting);
    assert!(!view.pending);
    assert!(view.messages.is_empty());
}

#[tokio::test]
async fn test_submit_answered() {
    let backend = MockBackend::new().with_reply("We offer Data Science and Data Engineering.");
    let state = make_state(backend);
    signed_in(&state).await;

    let (status, body) = send(
        &state,
        post_json("/chat/widget", json!({"text": "What programs do you offer?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let resp: SubmitResponse = serde_json::from_value(body).unwrap();
    assert_eq!(resp.outcome, "answered");
    assert!(!resp.pending);
    assert_eq!(resp.messages.len(), 2);
    assert_eq!(resp.messages[0].role, Role::User);
    assert_eq!(resp.messages[0].text, "What programs do you offer?");
    assert_eq!(resp.messages[1].role, Role::Assistant);
    assert_eq!(
        resp.message.unwrap().text,
        "We offer Data Science and Data Engineering."
    );
}

#[tokio::test]
async fn test_submit_backend_failure_returns_fallback() {
    let state = make_state(MockBackend::new().with_failure("quota exceeded"));
    signed_in(&state).await;

    let (status, body) = send(&state, post_json("/chat/widget", json!({"text": "Hello"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "fallback");
    assert_eq!(
        body["message"]["text"],
        HelpdeskConfig::default().chat.fallback_reply
    );
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_submit_whitespace_is_ignored() {
    let backend = MockBackend::new();
    let state = make_state(backend);
    signed_in(&state).await;

    let (status, body) = send(&state, post_json("/chat/widget", json!({"text": "   "}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "ignored_empty");
    assert!(body.get("message").is_none());
    assert!(body["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_while_pending_is_ignored() {
    let gate = Arc::new(Semaphore::new(0));
    let state = make_state(MockBackend::new().with_reply("first").with_gate(gate.clone()));
    signed_in(&state).await;

    let first = {
        let state = state.clone();
        tokio::spawn(async move {
            send(&state, post_json("/chat/widget", json!({"text": "one"}))).await
        })
    };
    let widget = state.surface("widget").unwrap();
    while !widget.is_pending() {
        tokio::task::yield_now().await;
    }

    let (status, body) = send(&state, post_json("/chat/widget", json!({"text": "two"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "ignored_pending");
    assert_eq!(body["pending"], true);

    let (_, view) = send(&state, get("/chat/widget")).await;
    assert_eq!(view["pending"], true);
    assert_eq!(view["messages"].as_array().unwrap().len(), 1);

    gate.add_permits(1);
    let (_, body) = first.await.unwrap();
    assert_eq!(body["outcome"], "answered");
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_surfaces_are_independent() {
    let state = make_state(MockBackend::new().with_default_reply("ok"));
    signed_in(&state).await;

    send(&state, post_json("/chat/widget", json!({"text": "from widget"}))).await;

    let (_, assistant) = send(&state, get("/chat/assistant")).await;
    assert!(assistant["messages"].as_array().unwrap().is_empty());
    let (_, widget) = send(&state, get("/chat/widget")).await;
    assert_eq!(widget["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_reset_clears_transcript() {
    let state = make_state(MockBackend::new().with_default_reply("ok"));
    signed_in(&state).await;

    send(&state, post_json("/chat/widget", json!({"text": "hello"}))).await;
    let (status, body) = send(&state, post_empty("/chat/widget/reset")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["messages"].as_array().unwrap().is_empty());
    assert_eq!(body["pending"], false);

    // Ids keep increasing after a reset.
    let (_, body) = send(&state, post_json("/chat/widget", json!({"text": "again"}))).await;
    assert_eq!(body["messages"][0]["id"], 3);
}

#[tokio::test]
async fn test_sign_out_resets_all_surfaces() {
    let state = make_state(MockBackend::new().with_default_reply("ok"));
    signed_in(&state).await;

    send(&state, post_json("/chat/widget", json!({"text": "a"}))).await;
    send(&state, post_json("/chat/assistant", json!({"text": "b"}))).await;

    let (status, body) = send(&state, post_empty("/auth/sign-out")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["signed_in"], false);

    for surface in ["widget", "assistant"] {
        assert!(state.surface(surface).unwrap().transcript().is_empty());
    }

    let (status, _) = send(&state, get("/chat/widget")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_custom_surfaces_from_config() {
    let mut config = HelpdeskConfig::default();
    config.chat.surfaces = vec!["kiosk".to_string()];
    let state = make_state_with(config, MockBackend::new());
    signed_in(&state).await;

    let (status, _) = send(&state, get("/chat/kiosk")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&state, get("/chat/widget")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Rate limiting
// =============================================================================

#[tokio::test]
async fn test_rate_limit_on_protected_routes() {
    let mut config = HelpdeskConfig::default();
    config.api.rate_limit_per_sec = 2;
    let state = make_state_with(config, MockBackend::new());
    signed_in(&state).await;

    // One router so every request shares the limiter.
    let router = create_router(state.clone());
    let mut statuses = Vec::new();
    for _ in 0..5 {
        let response = router.clone().oneshot(get("/chat/widget")).await.unwrap();
        statuses.push(response.status());
    }
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));

    // Public routes are not limited.
    for _ in 0..5 {
        let response = router.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
