//! The identity provider contract and the session state it publishes.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;

use crate::error::IdentityError;

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Snapshot of the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub present: bool,
    pub identity: Option<Identity>,
}

impl SessionState {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self {
            present: true,
            identity: Some(identity),
        }
    }
}

/// Issues and ends sessions, and notifies subscribers of every change.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;

    async fn sign_out(&self) -> Result<(), IdentityError>;

    fn current(&self) -> SessionState;

    /// Receiver that observes every subsequent session change.
    fn subscribe(&self) -> watch::Receiver<SessionState>;

    fn name(&self) -> &str {
        "identity"
    }
}

/// Session channel shared by provider implementations.
pub(crate) struct SessionChannel {
    tx: watch::Sender<SessionState>,
}

impl SessionChannel {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::absent());
        Self { tx }
    }

    /// Publish `state`; works whether or not anyone is subscribed.
    pub(crate) fn publish(&self, state: SessionState) {
        self.tx.send_replace(state);
    }

    pub(crate) fn current(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }
}
