use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{HelpdeskError, Result};

/// Top-level configuration for the Helpdesk application.
///
/// Loaded from `~/.helpdesk/config.toml` by default. Every section falls back
/// to its defaults when absent, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HelpdeskConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl HelpdeskConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: HelpdeskConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| HelpdeskError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// Read a secret from `inline` if set, otherwise from the environment
/// variable named by `env_var`.
fn resolve_secret(inline: &str, env_var: &str) -> Option<String> {
    if !inline.trim().is_empty() {
        return Some(inline.trim().to_string());
    }
    if env_var.is_empty() {
        return None;
    }
    std::env::var(env_var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// HTTP port for the API shell.
    pub port: u16,
    /// Name of the organisation the assistant speaks for.
    pub organisation: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            port: 3040,
            organisation: "LuxDev HQ".to_string(),
        }
    }
}

/// Which generative backend answers prompts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendProvider {
    #[default]
    Gemini,
    /// Canned replies, no network. For development without an API key.
    Mock,
}

/// Generative backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub provider: BackendProvider,
    /// Model name, e.g. "gemini-1.5-flash".
    pub model: String,
    /// Inline API key. Prefer `api_key_env` outside of local testing.
    pub api_key: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Base URL of the models endpoint.
    pub base_url: String,
    /// Upper bound on a single generation call, in seconds.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: BackendProvider::Gemini,
            model: "gemini-1.5-flash".to_string(),
            api_key: String::new(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            timeout_secs: 30,
        }
    }
}

impl BackendConfig {
    /// The API key from the config file or the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret(&self.api_key, &self.api_key_env)
    }
}

/// Conversation settings shared by every chat surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Names of the chat surfaces; each gets its own orchestrator.
    pub surfaces: Vec<String>,
    /// Greeting shown by shells before the first exchange.
    pub greeting: String,
    /// Opening instructions of every prompt. `{organisation}` is substituted.
    pub instructions: String,
    /// Closing guidance of every prompt.
    pub guidance: String,
    /// Reply appended when generation fails.
    pub fallback_reply: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            surfaces: vec!["widget".to_string(), "assistant".to_string()],
            greeting: "Hello! I'm your LuxDev HQ assistant. I can help you with information \
                       about our programs, admissions, and more. What would you like to know?"
                .to_string(),
            instructions: "You are an AI assistant helping users with real-time information \
                           about {organisation}."
                .to_string(),
            guidance: "Respond concisely and factually using the data above. \
                       Avoid hallucinating if unsure."
                .to_string(),
            fallback_reply: "I'm sorry, I'm having trouble processing your request right now. \
                             Please try again later or contact our support team."
                .to_string(),
        }
    }
}

/// Where the grounding context comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextSource {
    #[default]
    Static,
    File,
}

/// Grounding context configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub source: ContextSource,
    /// Context text used when `source = "static"`.
    pub text: String,
    /// File read when `source = "file"`.
    pub path: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            source: ContextSource::Static,
            text: [
                "LuxDev HQ is an edtech platform offering programs like Data Science, \
                 Data Analytics, Data Engineering, ML and AI.",
                "Recently launched a bootcamp in Nairobi (July 2025).",
                "Blog: https://luxdevhq.ai/blog",
                "FAQs: https://luxdevhq.ai/faqs",
                "Contact: info@luxdevhq.ai",
            ]
            .join("\n"),
            path: String::new(),
        }
    }
}

/// Which identity service signs users in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityProviderKind {
    /// Fixed credential table from `[[identity.users]]`.
    #[default]
    Memory,
    /// Firebase Authentication REST API.
    Firebase,
}

/// A credential accepted by the in-memory identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCredential {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Identity provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub provider: IdentityProviderKind,
    /// Firebase web API key.
    pub api_key: String,
    /// Environment variable holding the Firebase web API key.
    pub api_key_env: String,
    /// Firebase Auth REST endpoint.
    pub endpoint: String,
    pub users: Vec<UserCredential>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            provider: IdentityProviderKind::Memory,
            api_key: String::new(),
            api_key_env: "FIREBASE_API_KEY".to_string(),
            endpoint: "https://identitytoolkit.googleapis.com/v1".to_string(),
            users: vec![],
        }
    }
}

impl IdentityConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret(&self.api_key, &self.api_key_env)
    }
}

/// Speech capabilities for shells that can listen and talk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Speak assistant replies aloud.
    pub enabled: bool,
    /// Program invoked with the reply text as its last argument.
    pub tts_command: String,
    pub tts_args: Vec<String>,
    /// Program whose stdout is taken as one recognised utterance.
    /// Empty means speech input is unsupported.
    pub stt_command: String,
    pub stt_args: Vec<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            tts_command: "espeak".to_string(),
            tts_args: vec![],
            stt_command: String::new(),
            stt_args: vec![],
        }
    }
}

/// HTTP shell configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Requests per second allowed on protected routes.
    pub rate_limit_per_sec: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_sec: 20,
        }
    }
}
