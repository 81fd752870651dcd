//! Firebase Authentication over its REST API.
//!
//! Email/password sign-in goes through `accounts:signInWithPassword`. The REST
//! API has no server-side sign-out; ending a session only clears local state.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use helpdesk_core::config::IdentityConfig;

use crate::error::IdentityError;
use crate::provider::{Identity, IdentityProvider, SessionChannel, SessionState};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Error codes that mean the user typed the wrong thing.
const CREDENTIAL_ERRORS: &[&str] = &[
    "INVALID_PASSWORD",
    "EMAIL_NOT_FOUND",
    "INVALID_LOGIN_CREDENTIALS",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// Identity provider backed by Firebase Auth.
pub struct FirebaseIdentityProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    session: SessionChannel,
}

impl FirebaseIdentityProvider {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| IdentityError::Provider(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            session: SessionChannel::new(),
        })
    }

    /// Build from `[identity]`; fails when no web API key is configured.
    pub fn from_config(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            IdentityError::Provider(format!(
                "no Firebase API key: set identity.api_key or {}",
                config.api_key_env
            ))
        })?;
        Self::new(api_key, config.endpoint.clone())
    }

    fn sign_in_url(&self) -> String {
        format!(
            "{}/accounts:signInWithPassword",
            self.endpoint.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let response = self
            .client
            .post(self.sign_in_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&SignInRequest {
                email: email.trim(),
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| IdentityError::Provider(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IdentityError::Provider(format!("failed to read body: {}", e)))?;

        if !status.is_success() {
            return Err(map_error(status.as_u16(), &body));
        }

        let parsed: SignInResponse = serde_json::from_str(&body)
            .map_err(|e| IdentityError::Provider(format!("malformed response: {}", e)))?;
        let identity = Identity {
            uid: parsed.local_id,
            email: if parsed.email.is_empty() {
                email.trim().to_string()
            } else {
                parsed.email
            },
            display_name: parsed.display_name.filter(|n| !n.is_empty()),
        };

        self.session.publish(SessionState::signed_in(identity.clone()));
        tracing::info!(uid = %identity.uid, "Signed in via Firebase");
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
        "firebase"
    }
}

/// Firebase reports codes like `TOO_MANY_ATTEMPTS_TRY_LATER : detail`.
fn map_error(status: u16, body: &str) -> IdentityError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_default();
    let code = message.split(" : ").next().unwrap_or_default().trim();

    if CREDENTIAL_ERRORS.contains(&code) {
        IdentityError::InvalidCredentials
    } else if code.is_empty() {
        IdentityError::Provider(format!("HTTP {}", status))
    } else {
        IdentityError::Provider(format!("HTTP {}: {}", status, code))
    }
}
