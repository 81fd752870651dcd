//! Gemini REST implementation of the generative response backend.
//!
//! Sends the assembled prompt as a single user turn to
//! `{base_url}/{model}:generateContent` and returns the text of the first
//! candidate. Transport errors, non-success statuses, unparsable bodies and
//! empty or blocked candidates all surface as `ChatError::GenerationFailed`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use helpdesk_chat::{ChatError, GenerativeBackend};
use helpdesk_core::config::BackendConfig;
use helpdesk_core::error::{HelpdeskError, Result};

const API_KEY_HEADER: &str = "x-goog-api-key";

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
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

// =============================================================================
// Backend
// =============================================================================

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiBackend {
    /// Build a backend from `[backend]`.
    ///
    /// Fails when no API key is configured inline or in the environment.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            HelpdeskError::Config(format!(
                "no Gemini API key: set backend.api_key or {}",
                config.api_key_env
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| HelpdeskError::Backend(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, ChatError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::GenerationFailed(format!("request timeout: {}", e))
                } else {
                    ChatError::GenerationFailed(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ChatError::GenerationFailed(format!("failed to read body: {}", e)))?;

        if !status.is_success() {
            return Err(map_http_error(status, &text));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| ChatError::GenerationFailed(format!("malformed response: {}", e)))?;
        let reply = extract_text(parsed)?;
        tracing::debug!(model = %self.model, reply_len = reply.len(), "Gemini replied");
        Ok(reply)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Text of the first candidate, all parts concatenated.
fn extract_text(response: GenerateContentResponse) -> std::result::Result<String, ChatError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!("prompt blocked: {}", r))
            .unwrap_or_else(|| "no candidates in response".to_string());
        return Err(ChatError::GenerationFailed(reason));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        return Err(ChatError::GenerationFailed(format!(
            "empty candidate (finish reason: {})",
            reason
        )));
    }
    Ok(text)
}

fn map_http_error(status: StatusCode, body: &str) -> ChatError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());

    let class = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => "authentication rejected",
        StatusCode::TOO_MANY_REQUESTS => "quota exceeded",
        StatusCode::BAD_REQUEST => "invalid request",
        s if s.is_server_error() => "server error",
        _ => "unexpected status",
    };
    ChatError::GenerationFailed(format!("{} (HTTP {}): {}", class, status.as_u16(), detail))
}

// =============================================================================
// Tests
// =============================================================================
