//! Identity-gated conversation reset.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use helpdesk_chat::ConversationOrchestrator;
use helpdesk_core::events::DomainEvent;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::error::IdentityError;
use crate::provider::{Identity, IdentityProvider, SessionState};

/// Connects an identity provider to the conversations it guards.
///
/// Every registered orchestrator is reset exactly once each time the session
/// goes from present to absent, whether the sign-out came through
/// [`SessionGate::sign_out`] or from the provider on its own.
pub struct SessionGate {
    provider: Arc<dyn IdentityProvider>,
    orchestrators: Mutex<Vec<Arc<ConversationOrchestrator>>>,
    was_present: AtomicBool,
    events: Option<broadcast::Sender<DomainEvent>>,
}

impl SessionGate {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let was_present = provider.current().present;
        Self {
            provider,
            orchestrators: Mutex::new(Vec::new()),
            was_present: AtomicBool::new(was_present),
            events: None,
        }
    }

    /// Publish session start and end on `events`.
    pub fn with_events(mut self, events: broadcast::Sender<DomainEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    /// Add an orchestrator to reset on sign-out.
    pub fn register(&self, orchestrator: Arc<ConversationOrchestrator>) {
        self.lock_orchestrators().push(orchestrator);
    }

    pub fn is_signed_in(&self) -> bool {
        self.provider.current().present
    }

    pub fn session(&self) -> SessionState {
        self.provider.current()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let identity = self.provider.sign_in(email, password).await?;
        self.observe(&self.provider.current());
        Ok(identity)
    }

    /// End the session and reset every registered conversation before
    /// returning.
    pub async fn sign_out(&self) -> Result<(), IdentityError> {
        self.provider.sign_out().await?;
        self.observe(&self.provider.current());
        Ok(())
    }

    /// Follow the provider's session channel in a background task.
    ///
    /// The task holds only a weak reference and stops once the gate or the
    /// provider's channel is gone.
    pub fn watch(self: &Arc<Self>) -> JoinHandle<()> {
        let mut rx = self.provider.subscribe();
        let gate: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                match gate.upgrade() {
                    Some(gate) => gate.observe(&state),
                    None => break,
                }
            }
            tracing::debug!("Session watcher stopped");
        })
    }

    fn observe(&self, state: &SessionState) {
        let was_present = self.was_present.swap(state.present, Ordering::SeqCst);
        match (was_present, state.present) {
            (true, false) => {
                let count = self.reset_all();
                self.publish(DomainEvent::session_ended(count));
            }
            (false, true) => {
                let email = state
                    .identity
                    .as_ref()
                    .map(|i| i.email.as_str())
                    .unwrap_or_default();
                self.publish(DomainEvent::session_started(email));
            }
            _ => {}
        }
    }

    fn reset_all(&self) -> usize {
        let orchestrators = self.lock_orchestrators();
        for orchestrator in orchestrators.iter() {
            orchestrator.reset();
        }
        tracing::info!(count = orchestrators.len(), "Session ended; conversations reset");
        orchestrators.len()
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(ref events) = self.events {
            let _ = events.send(event);
        }
    }

    fn lock_orchestrators(&self) -> MutexGuard<'_, Vec<Arc<ConversationOrchestrator>>> {
        self.orchestrators
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryIdentityProvider;
    use helpdesk_chat::{MockBackend, StaticContext, SubmitOutcome};
    use std::time::Duration;

    fn orchestrator() -> Arc<ConversationOrchestrator> {
        Arc::new(ConversationOrchestrator::new(
            Arc::new(MockBackend::new().with_default_reply("ok")),
            Arc::new(StaticContext::new("facts")),
        ))
    }

    fn provider() -> Arc<InMemoryIdentityProvider> {
        Arc::new(InMemoryIdentityProvider::with_user("a@b.c", "pw"))
    }

    async fn wait_until(mut cond: impl FnMut() -> bool) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_sign_out_resets_registered_orchestrators() {
        let gate = SessionGate::new(provider());
        let widget = orchestrator();
        let assistant = orchestrator();
        gate.register(widget.clone());
        gate.register(assistant.clone());

        gate.sign_in("a@b.c", "pw").await.unwrap();
        assert!(gate.is_signed_in());
        assert!(matches!(widget.submit("hi").await, SubmitOutcome::Answered(_)));
        assert!(matches!(assistant.submit("hello").await, SubmitOutcome::Answered(_)));

        gate.sign_out().await.unwrap();
        assert!(!gate.is_signed_in());
        assert!(widget.transcript().is_empty());
        assert!(assistant.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_failed_sign_in_keeps_state() {
        let gate = SessionGate::new(provider());
        assert_eq!(
            gate.sign_in("a@b.c", "nope").await.unwrap_err(),
            IdentityError::InvalidCredentials
        );
        assert!(!gate.is_signed_in());
        assert_eq!(gate.session(), SessionState::absent());
    }

    #[tokio::test]
    async fn test_watch_resets_on_provider_sign_out() {
        let provider = provider();
        let gate = Arc::new(SessionGate::new(provider.clone()));
        let widget = orchestrator();
        gate.register(widget.clone());
        let _watcher = gate.watch();

        provider.sign_in("a@b.c", "pw").await.unwrap();
        wait_until(|| gate.was_present.load(Ordering::SeqCst)).await;
        widget.submit("question").await;
        assert_eq!(widget.transcript().len(), 2);

        provider.sign_out().await.unwrap();
        wait_until(|| widget.transcript().is_empty()).await;
    }

    #[tokio::test]
    async fn test_sign_in_does_not_reset() {
        let provider = provider();
        let gate = Arc::new(SessionGate::new(provider.clone()));
        let widget = orchestrator();
        gate.register(widget.clone());
        let _watcher = gate.watch();

        widget.submit("before sign-in").await;
        gate.sign_in("a@b.c", "pw").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(widget.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_watcher_stops_when_gate_dropped() {
        let provider = provider();
        let gate = Arc::new(SessionGate::new(provider.clone()));
        let watcher = gate.watch();
        drop(gate);

        provider.sign_in("a@b.c", "pw").await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), watcher)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_session_events_published_once_per_transition() {
        let (tx, mut rx) = broadcast::channel(16);
        let gate = Arc::new(SessionGate::new(provider()).with_events(tx));
        gate.register(orchestrator());
        gate.register(orchestrator());
        let _watcher = gate.watch();

        gate.sign_in("a@b.c", "pw").await.unwrap();
        gate.sign_out().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let events: Vec<DomainEvent> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            DomainEvent::SessionStarted { email, .. } => assert_eq!(email, "a@b.c"),
            other => panic!("unexpected event: {:?}", other),
        }
        match &events[1] {
            DomainEvent::SessionEnded {
                conversations_reset,
                ..
            } => assert_eq!(*conversations_reset, 2),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
