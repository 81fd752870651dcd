//! Route handler functions for all API endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use helpdesk_core::types::Message;
use helpdesk_identity::{Identity, SessionState};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub signed_in: bool,
    pub surfaces: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub identity: Identity,
}

#[derive(Debug, Serialize)]
pub struct SignOutResponse {
    pub signed_in: bool,
}

/// Full view of one chat surface.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatView {
    pub surface: String,
    /// Shown above the transcript; not part of it.
    pub greeting: String,
    pub pending: bool,
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// One of `answered`, `fallback`, `ignored_empty`, `ignored_pending`,
    /// `ignored` or `discarded`.
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    pub pending: bool,
    pub messages: Vec<Message>,
}

// =============================================================================
// Health
// =============================================================================

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        signed_in: state.gate.is_signed_in(),
        surfaces: state.surface_names(),
    })
}

// =============================================================================
// Session
// =============================================================================

/// GET /auth/session
pub async fn session(State(state): State<AppState>) -> Json<SessionState> {
    Json(state.gate.session())
}

/// POST /auth/sign-in
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "email and password are required".to_string(),
        ));
    }
    let identity = state.gate.sign_in(&req.email, &req.password).await?;
    Ok(Json(SignInResponse { identity }))
}

/// POST /auth/sign-out - ends the session and clears every chat.
pub async fn sign_out(State(state): State<AppState>) -> Result<Json<SignOutResponse>, ApiError> {
    state.gate.sign_out().await?;
    Ok(Json(SignOutResponse {
        signed_in: state.gate.is_signed_in(),
    }))
}

// =============================================================================
// Chat
// =============================================================================

/// GET /chat/{surface}
pub async fn get_chat(
    State(state): State<AppState>,
    Path(surface): Path<String>,
) -> Result<Json<ChatView>, ApiError> {
    let orchestrator = state.surface(&surface)?;
    Ok(Json(ChatView {
        greeting: state.config.chat.greeting.clone(),
        pending: orchestrator.is_pending(),
        messages: orchestrator.transcript(),
        surface,
    }))
}

/// POST /chat/{surface}
///
/// Always 200 for a known surface: ignored and failed submissions are
/// reported through `outcome`.
pub async fn submit(
    State(state): State<AppState>,
    Path(surface): Path<String>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let orchestrator = state.surface(&surface)?;
    let outcome = orchestrator.submit(&req.text).await;
    tracing::debug!(surface = %surface, outcome = outcome.kind(), "Chat submission");

    Ok(Json(SubmitResponse {
        outcome: outcome.kind().to_string(),
        message: outcome.message().cloned(),
        pending: orchestrator.is_pending(),
        messages: orchestrator.transcript(),
    }))
}

/// POST /chat/{surface}/reset
pub async fn reset_chat(
    State(state): State<AppState>,
    Path(surface): Path<String>,
) -> Result<Json<ChatView>, ApiError> {
    let orchestrator = state.surface(&surface)?;
    orchestrator.reset();
    Ok(Json(ChatView {
        greeting: state.config.chat.greeting.clone(),
        pending: orchestrator.is_pending(),
        messages: orchestrator.transcript(),
        surface,
    }))
}
