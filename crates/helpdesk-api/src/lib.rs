//! Helpdesk API crate - axum HTTP shell over the conversation orchestrators.
//!
//! Exposes one chat per configured surface, email/password sign-in and
//! sign-out, and a health check. Chat routes are only reachable while a
//! session is present.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
