//! Identity gating for the Helpdesk shells.
//!
//! An [`IdentityProvider`] issues sessions and publishes session changes on a
//! `tokio::sync::watch` channel. The [`SessionGate`] listens on that channel
//! and resets every registered conversation when the session ends, so a new
//! visitor never sees the previous visitor's transcript.

pub mod error;
pub mod firebase;
pub mod gate;
pub mod memory;
pub mod provider;

use std::sync::Arc;

use helpdesk_core::config::{IdentityConfig, IdentityProviderKind};

pub use error::IdentityError;
pub use firebase::FirebaseIdentityProvider;
pub use gate::SessionGate;
pub use memory::InMemoryIdentityProvider;
pub use provider::{Identity, IdentityProvider, SessionState};

/// Build the provider selected by `[identity]`.
pub fn from_config(config: &IdentityConfig) -> Result<Arc<dyn IdentityProvider>, IdentityError> {
    match config.provider {
        IdentityProviderKind::Memory => {
            if config.users.is_empty() {
                tracing::warn!("Memory identity provider has no users; sign-in will always fail");
            }
            Ok(Arc::new(InMemoryIdentityProvider::new(config.users.clone())))
        }
        IdentityProviderKind::Firebase => {
            Ok(Arc::new(FirebaseIdentityProvider::from_config(config)?))
        }
    }
}
