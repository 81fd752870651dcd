//! Credential-table provider for development and tests.

use async_trait::async_trait;
use helpdesk_core::config::UserCredential;
use tokio::sync::watch;

use crate::error::IdentityError;
use crate::provider::{Identity, IdentityProvider, SessionChannel, SessionState};

/// Signs users in against a fixed list of credentials.
pub struct InMemoryIdentityProvider {
    users: Vec<UserCredential>,
    session: SessionChannel,
}

impl InMemoryIdentityProvider {
    pub fn new(users: Vec<UserCredential>) -> Self {
        Self {
            users,
            session: SessionChannel::new(),
        }
    }

    /// Convenience for a single known user.
    pub fn with_user(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(vec![UserCredential {
            email: email.into(),
            password: password.into(),
            display_name: None,
        }])
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let email = email.trim();
        let user = self
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email) && u.password == password)
            .ok_or(IdentityError::InvalidCredentials)?;

        let identity = Identity {
            uid: format!("local:{}", user.email.to_ascii_lowercase()),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
        };
        self.session.publish(SessionState::signed_in(identity.clone()));
        tracing::info!(email = %identity.email, "Signed in");
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.session.publish(SessionState::absent());
        tracing::info!("Signed out");
        Ok(())
    }

    fn current(&self) -> SessionState {
        self.session.current()
    }

    fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.session.subscribe()
    }

    fn name(&self) -> &str {
        "memory"
    }
}
