//! Conversation orchestrator: owns the transcript and drives one exchange
//! per accepted submission.
//!
//! At most one request is outstanding per orchestrator. Submissions made
//! while a request is pending are dropped, not queued. `reset()` starts a new
//! generation; a response belonging to an older generation is discarded
//! instead of being appended to the cleared transcript.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use helpdesk_core::config::HelpdeskConfig;
use helpdesk_core::events::DomainEvent;
use helpdesk_core::types::{Message, Role};
use tokio::sync::broadcast;

use crate::backend::GenerativeBackend;
use crate::context::ContextSupplier;
use crate::error::ChatError;
use crate::prompt::PromptBuilder;

/// Default upper bound on one context fetch and on one backend call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of one `submit` call. Never an error: failures are already folded
/// into the transcript by the time this is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The backend answered; the reply was appended.
    Answered(Message),
    /// The backend failed; the fallback reply was appended.
    Fallback(Message),
    /// Nothing happened (`EmptyInput` or `RequestAlreadyPending`).
    Ignored(ChatError),
    /// The orchestrator was reset while the request was in flight.
    Discarded,
}

impl SubmitOutcome {
    /// The assistant message appended by this submission, if any.
    pub fn message(&self) -> Option<&Message> {
        match self {
            SubmitOutcome::Answered(m) | SubmitOutcome::Fallback(m) => Some(m),
            _ => None,
        }
    }

    /// Stable machine-readable name of the outcome.
    pub fn kind(&self) -> &'static str {
        match self {
            SubmitOutcome::Answered(_) => "answered",
            SubmitOutcome::Fallback(_) => "fallback",
            SubmitOutcome::Ignored(ChatError::RequestAlreadyPending) => "ignored_pending",
            SubmitOutcome::Ignored(ChatError::EmptyInput) => "ignored_empty",
            SubmitOutcome::Ignored(_) => "ignored",
            SubmitOutcome::Discarded => "discarded",
        }
    }
}

#[derive(Debug)]
struct ConversationState {
    transcript: Vec<Message>,
    pending: bool,
    generation: u64,
    next_id: u64,
    context: Option<String>,
}

impl ConversationState {
    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Central chat orchestrator for one presentation surface.
pub struct ConversationOrchestrator {
    backend: Arc<dyn GenerativeBackend>,
    context_supplier: Arc<dyn ContextSupplier>,
    prompt: PromptBuilder,
    fallback_reply: String,
    timeout: Duration,
    surface: String,
    events: Option<broadcast::Sender<DomainEvent>>,
    state: Mutex<ConversationState>,
}

impl ConversationOrchestrator {
    /// Create an orchestrator with the default prompt, fallback reply and
    /// timeout.
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        context_supplier: Arc<dyn ContextSupplier>,
    ) -> Self {
        let chat = helpdesk_core::config::ChatConfig::default();
        Self {
            backend,
            context_supplier,
            prompt: PromptBuilder::default(),
            fallback_reply: chat.fallback_reply,
            timeout: DEFAULT_TIMEOUT,
            surface: "default".to_string(),
            events: None,
            state: Mutex::new(ConversationState {
                transcript: Vec::new(),
                pending: false,
                generation: 0,
                next_id: 1,
                context: None,
            }),
        }
    }

    /// Create an orchestrator configured from `[general]`, `[chat]` and
    /// `[backend]`.
    pub fn from_config(
        config: &HelpdeskConfig,
        backend: Arc<dyn GenerativeBackend>,
        context_supplier: Arc<dyn ContextSupplier>,
    ) -> Self {
        Self::new(backend, context_supplier)
            .with_prompt(PromptBuilder::from_config(
                &config.chat,
                &config.general.organisation,
            ))
            .with_fallback_reply(config.chat.fallback_reply.clone())
            .with_timeout(Duration::from_secs(config.backend.timeout_secs.max(1)))
    }

    pub fn with_prompt(mut self, prompt: PromptBuilder) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_fallback_reply(mut self, reply: impl Into<String>) -> Self {
        self.fallback_reply = reply.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Publish appended messages and resets for `surface` on `events`.
    pub fn with_events(
        mut self,
        surface: impl Into<String>,
        events: broadcast::Sender<DomainEvent>,
    ) -> Self {
        self.surface = surface.into();
        self.events = Some(events);
        self
    }

    pub fn surface(&self) -> &str {
        &self.surface
    }

    /// Submit one user utterance.
    ///
    /// Whitespace-only input and input arriving while a request is pending
    /// leave the transcript untouched. Otherwise the user message is appended
    /// immediately and exactly one assistant message follows once the
    /// backend settles, whatever its outcome.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            tracing::debug!("Ignoring empty chat input");
            return SubmitOutcome::Ignored(ChatError::EmptyInput);
        }

        let (id, generation) = {
            let mut state = self.lock_state();
            if state.pending {
                tracing::debug!("Ignoring chat input while a request is pending");
                return SubmitOutcome::Ignored(ChatError::RequestAlreadyPending);
            }
            let id = state.allocate_id();
            state.transcript.push(Message::user(id, text));
            state.pending = true;
            (id, state.generation)
        };
        self.publish(DomainEvent::message_appended(&self.surface, id, Role::User));

        let in_flight = InFlight {
            orchestrator: self,
            generation,
            settled: false,
        };

        let context = self.context_snippet(generation).await;
        let prompt = self.prompt.build(&context, text);

        tracing::debug!(
            backend = self.backend.name(),
            prompt_len = prompt.len(),
            "Requesting generation"
        );
        let result = match tokio::time::timeout(self.timeout, self.backend.generate(&prompt)).await
        {
            Ok(result) => result,
            Err(_) => Err(ChatError::GenerationFailed(format!(
                "timed out after {}s",
                self.timeout.as_secs_f64()
            ))),
        };

        in_flight.settle(result)
    }

    /// Snapshot of the transcript, oldest first.
    pub fn transcript(&self) -> Vec<Message> {
        self.lock_state().transcript.clone()
    }

    /// Whether a request is in flight.
    pub fn is_pending(&self) -> bool {
        self.lock_state().pending
    }

    /// Newest assistant message, if any.
    pub fn latest_assistant(&self) -> Option<Message> {
        self.lock_state()
            .transcript
            .iter()
            .rev()
            .find(|m| m.is_assistant())
            .cloned()
    }

    /// Clear the transcript, the pending flag and the cached context.
    ///
    /// Any request still in flight belongs to the previous generation and
    /// its response will be discarded.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        state.transcript.clear();
        state.pending = false;
        state.context = None;
        state.generation += 1;
        tracing::debug!(generation = state.generation, "Conversation reset");
        self.publish(DomainEvent::conversation_reset(&self.surface, state.generation));
    }

    /// Fetch and cache the context ahead of the first submission.
    pub async fn preload_context(&self) {
        let generation = self.lock_state().generation;
        let _ = self.context_snippet(generation).await;
    }

    // -- Private helpers --

    fn lock_state(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            tracing::error!("Conversation state lock poisoned; recovering");
            poisoned.into_inner()
        })
    }

    /// Cached context, or a fresh fetch. Failures degrade to an empty string
    /// and are not cached, so the next submission tries again.
    async fn context_snippet(&self, generation: u64) -> String {
        let cached = self.lock_state().context.clone();
        if let Some(cached) = cached {
            return cached;
        }

        let fetched = tokio::time::timeout(self.timeout, self.context_supplier.fetch())
            .await
            .unwrap_or_else(|_| {
                Err(ChatError::ContextUnavailable(format!(
                    "timed out after {}s",
                    self.timeout.as_secs_f64()
                )))
            });

        match fetched {
            Ok(text) => {
                let mut state = self.lock_state();
                if state.generation == generation {
                    state.context = Some(text.clone());
                }
                text
            }
            Err(e) => {
                tracing::warn!(error = %e, "Context unavailable; continuing without it");
                String::new()
            }
        }
    }

    fn settle(&self, generation: u64, result: Result<String, ChatError>) -> SubmitOutcome {
        let mut state = self.lock_state();
        if state.generation != generation {
            tracing::info!("Discarding response that arrived after a reset");
            self.publish(DomainEvent::response_discarded(&self.surface, generation));
            return SubmitOutcome::Discarded;
        }

        state.pending = false;
        let id = state.allocate_id();
        let outcome = match result {
            Ok(reply) if !reply.trim().is_empty() => {
                SubmitOutcome::Answered(Message::assistant(id, reply))
            }
            Ok(_) => {
                tracing::warn!("Backend returned an empty reply; using fallback");
                SubmitOutcome::Fallback(Message::assistant(id, self.fallback_reply.clone()))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Generation failed; using fallback");
                SubmitOutcome::Fallback(Message::assistant(id, self.fallback_reply.clone()))
            }
        };

        if let Some(message) = outcome.message() {
            state.transcript.push(message.clone());
            self.publish(DomainEvent::message_appended(
                &self.surface,
                message.id,
                Role::Assistant,
            ));
        }
        outcome
    }

    /// Send `event` if a channel is attached; having no subscribers is fine.
    fn publish(&self, event: DomainEvent) {
        if let Some(ref events) = self.events {
            let _ = events.send(event);
        }
    }
}

/// Settles an accepted submission exactly once, including when the `submit`
/// future is dropped before the backend answers.
struct InFlight<'a> {
    orchestrator: &'a ConversationOrchestrator,
    generation: u64,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, result: Result<String, ChatError>) -> SubmitOutcome {
        self.settled = true;
        self.orchestrator.settle(self.generation, result)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let _ = self.orchestrator.settle(
                self.generation,
                Err(ChatError::GenerationFailed("request cancelled".to_string())),
            );
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
