//! Fixed-window request limiter applied to the chat routes.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{Extension, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

const WINDOW: Duration = Duration::from_secs(1);

struct Window {
    started: Instant,
    count: u64,
}

/// Allows at most `max_per_sec` requests in each one-second window.
///
/// A limit of zero disables limiting.
#[derive(Clone)]
pub struct RateLimiter {
    max_per_sec: u64,
    window: Arc<Mutex<Window>>,
}

impl RateLimiter {
    pub fn new(max_per_sec: u64) -> Self {
        Self {
            max_per_sec,
            window: Arc::new(Mutex::new(Window {
                started: Instant::now(),
                count: 0,
            })),
        }
    }

    /// Count one request; false once the current window is full.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> bool {
        if self.max_per_sec == 0 {
            return true;
        }
        let mut window = self
            .window
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if now.saturating_duration_since(window.started) >= WINDOW {
            window.started = now;
            window.count = 0;
        }
        if window.count < self.max_per_sec {
            window.count += 1;
            true
        } else {
            false
        }
    }
}

/// Axum middleware that enforces the limit with a 429 JSON response.
pub async fn rate_limit_middleware(
    Extension(limiter): Extension<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    if limiter.try_acquire() {
        next.run(req).await
    } else {
        tracing::debug!(path = %req.uri().path(), "Rate limit exceeded");
        ApiError::TooManyRequests.into_response()
    }
}
