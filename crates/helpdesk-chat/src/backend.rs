//! Generative response backend abstraction.
//!
//! A backend takes one prompt string and returns one generated string. Every
//! failure mode (transport, status, malformed body, quota) is collapsed into
//! `ChatError::GenerationFailed`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::error::ChatError;

/// Hosted model that turns a prompt into generated text.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Generate a reply for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, ChatError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "backend"
    }
}

// =============================================================================
// Mock implementation
// =============================================================================

const MOCK_DEFAULT_REPLY: &str =
    "Thanks for reaching out! An advisor will follow up with more details shortly.";

/// Backend with scripted replies and no network access.
///
/// Scripted replies are consumed in order; once the script is exhausted every
/// call returns the default reply. An optional gate holds each call until a
/// permit is released, which keeps a request pending for as long as a test
/// needs.
pub struct MockBackend {
    script: Mutex<VecDeque<Result<String, ChatError>>>,
    default_reply: String,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
    delay: Option<std::time::Duration>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_reply: MOCK_DEFAULT_REPLY.to_string(),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            gate: None,
            delay: None,
        }
    }

    /// Queue a successful reply.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.push(Ok(reply.into()));
        self
    }

    /// Queue a failed generation.
    pub fn with_failure(self, reason: impl Into<String>) -> Self {
        self.push(Err(ChatError::GenerationFailed(reason.into())));
        self
    }

    /// Reply used once the script is exhausted.
    pub fn with_default_reply(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = reply.into();
        self
    }

    /// Hold every call until a permit is added to `gate`.
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(&self, entry: Result<String, ChatError>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(entry);
        }
    }

    /// Number of `generate` calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl GenerativeBackend for MockBackend {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        if let Some(ref gate) = self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| ChatError::GenerationFailed(format!("gate closed: {}", e)))?;
            permit.forget();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        scripted.unwrap_or_else(|| Ok(self.default_reply.clone()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_replays_script_then_default() {
        let backend = MockBackend::new()
            .with_reply("first")
            .with_failure("network down")
            .with_default_reply("fallback default");

        assert_eq!(backend.generate("a").await.unwrap(), "first");
        assert_eq!(
            backend.generate("b").await.unwrap_err(),
            ChatError::GenerationFailed("network down".to_string())
        );
        assert_eq!(backend.generate("c").await.unwrap(), "fallback default");
        assert_eq!(backend.calls(), 3);
        assert_eq!(backend.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_mock_gate_holds_until_permit() {
        let gate = Arc::new(Semaphore::new(0));
        let backend = Arc::new(MockBackend::new().with_reply("done").with_gate(gate.clone()));

        let task = {
            let backend = Arc::clone(&backend);
            tokio::spawn(async move { backend.generate("hold").await })
        };
        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        gate.add_permits(1);
        assert_eq!(task.await.unwrap().unwrap(), "done");
    }

    #[test]
    fn test_mock_name() {
        assert_eq!(MockBackend::new().name(), "mock");
    }
}
