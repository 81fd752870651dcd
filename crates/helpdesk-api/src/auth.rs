//! Session gating for protected routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::state::AppState;

/// Middleware that rejects requests with 401 unless a session is present.
pub async fn require_session(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if state.gate.is_signed_in() {
        next.run(req).await
    } else {
        ApiError::Unauthorized("Sign in to use the assistant".to_string()).into_response()
    }
}
