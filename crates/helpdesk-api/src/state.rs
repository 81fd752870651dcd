//! Application state shared across all route handlers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use helpdesk_chat::{ContextSupplier, ConversationOrchestrator, GenerativeBackend};
use helpdesk_core::config::HelpdeskConfig;
use helpdesk_core::events::DomainEvent;
use helpdesk_identity::SessionGate;
use tokio::sync::broadcast;

use crate::error::ApiError;

/// Shared application state.
///
/// Cloned into every handler; all fields are reference counted.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<HelpdeskConfig>,
    /// One orchestrator per chat surface, keyed by surface name.
    pub surfaces: Arc<HashMap<String, Arc<ConversationOrchestrator>>>,
    pub gate: Arc<SessionGate>,
    /// Conversation and session events from every surface and the gate.
    pub event_tx: broadcast::Sender<DomainEvent>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create one orchestrator per configured surface and register each with
    /// the session gate. All of them publish on `event_tx`.
    pub fn new(
        config: HelpdeskConfig,
        backend: Arc<dyn GenerativeBackend>,
        context: Arc<dyn ContextSupplier>,
        gate: SessionGate,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let gate = Arc::new(gate.with_events(event_tx.clone()));
        let surfaces = config
            .chat
            .surfaces
            .iter()
            .map(|name| {
                let orchestrator = Arc::new(
                    ConversationOrchestrator::from_config(
                        &config,
                        Arc::clone(&backend),
                        Arc::clone(&context),
                    )
                    .with_events(name.clone(), event_tx.clone()),
                );
                gate.register(Arc::clone(&orchestrator));
                (name.clone(), orchestrator)
            })
            .collect();

        Self {
            config: Arc::new(config),
            surfaces: Arc::new(surfaces),
            gate,
            event_tx,
            start_time: Instant::now(),
        }
    }

    /// Look up the orchestrator behind a surface name.
    pub fn surface(&self, name: &str) -> Result<Arc<ConversationOrchestrator>, ApiError> {
        self.surfaces
            .get(name)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Unknown chat surface: {}", name)))
    }

    /// Surface names in sorted order.
    pub fn surface_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.surfaces.keys().cloned().collect();
        names.sort();
        names
    }
}
