//! Optional speech capabilities for presentation shells.
//!
//! Speech input fills the next chat message from one recognition session;
//! speech output reads assistant replies aloud. Both are injected as
//! capabilities that may be unsupported, and neither affects orchestrator
//! state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use helpdesk_core::config::SpeechConfig;
use helpdesk_core::types::Message;

use crate::error::ChatError;

/// One-shot speech recognition.
#[async_trait]
pub trait SpeechInput: Send + Sync {
    /// Listen for a single utterance and return its transcript.
    async fn recognize(&self) -> Result<String, ChatError>;
}

/// Fire-and-forget text-to-speech.
pub trait SpeechOutput: Send + Sync {
    fn speak(&self, text: &str);
}

/// A capability the host may or may not provide.
pub enum Speech<T> {
    Supported(T),
    Unsupported,
}

impl<T> Speech<T> {
    pub fn is_supported(&self) -> bool {
        matches!(self, Speech::Supported(_))
    }

    pub fn capability(&self) -> Option<&T> {
        match self {
            Speech::Supported(inner) => Some(inner),
            Speech::Unsupported => None,
        }
    }
}

/// Speech capabilities bundled for a shell.
pub struct VoiceInterface {
    input: Speech<Arc<dyn SpeechInput>>,
    output: Speech<Arc<dyn SpeechOutput>>,
    listening: AtomicBool,
}

impl VoiceInterface {
    pub fn new(
        input: Speech<Arc<dyn SpeechInput>>,
        output: Speech<Arc<dyn SpeechOutput>>,
    ) -> Self {
        Self {
            input,
            output,
            listening: AtomicBool::new(false),
        }
    }

    /// Neither input nor output.
    pub fn unsupported() -> Self {
        Self::new(Speech::Unsupported, Speech::Unsupported)
    }

    /// Build command-backed capabilities from `[speech]`.
    ///
    /// Output is only supported when `enabled` is set; input when an STT
    /// command is configured.
    pub fn from_config(config: &SpeechConfig) -> Self {
        let input: Speech<Arc<dyn SpeechInput>> = if config.stt_command.trim().is_empty() {
            Speech::Unsupported
        } else {
            Speech::Supported(Arc::new(CommandSpeechInput::new(
                config.stt_command.clone(),
                config.stt_args.clone(),
            )))
        };
        let output: Speech<Arc<dyn SpeechOutput>> =
            if config.enabled && !config.tts_command.trim().is_empty() {
                Speech::Supported(Arc::new(CommandSpeechOutput::new(
                    config.tts_command.clone(),
                    config.tts_args.clone(),
                )))
            } else {
                Speech::Unsupported
            };
        Self::new(input, output)
    }

    pub fn can_listen(&self) -> bool {
        self.input.is_supported()
    }

    pub fn can_speak(&self) -> bool {
        self.output.is_supported()
    }

    /// Whether a recognition session is active.
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Run one recognition session.
    ///
    /// Fails if speech input is unsupported, a session is already active, or
    /// nothing was recognised.
    pub async fn listen(&self) -> Result<String, ChatError> {
        let input = self.input.capability().ok_or_else(|| {
            ChatError::VoiceError("speech recognition is not supported".to_string())
        })?;

        if self.listening.swap(true, Ordering::SeqCst) {
            return Err(ChatError::VoiceError(
                "speech recognition is already active".to_string(),
            ));
        }
        let _session = ListeningSession(&self.listening);

        let transcript = input.recognize().await?;
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Err(ChatError::VoiceError("no speech recognised".to_string()));
        }
        Ok(transcript.to_string())
    }

    /// Speak `message` if it is an assistant reply and output is supported.
    ///
    /// Returns whether anything was spoken.
    pub fn announce(&self, message: &Message) -> bool {
        match self.output.capability() {
            Some(output) if message.is_assistant() => {
                output.speak(&message.text);
                true
            }
            _ => false,
        }
    }
}

/// Clears the listening flag when a recognition session ends, however it ends.
struct ListeningSession<'a>(&'a AtomicBool);

impl Drop for ListeningSession<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// =============================================================================
// Command-backed implementations
// =============================================================================

/// Speaks text by spawning a TTS program with the text as its last argument.
pub struct CommandSpeechOutput {
    program: String,
    args: Vec<String>,
}

impl CommandSpeechOutput {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl SpeechOutput for CommandSpeechOutput {
    fn speak(&self, text: &str) {
        if tokio::runtime::Handle::try_current().is_err() {
            tracing::warn!("Speech output requires a tokio runtime; skipping");
            return;
        }

        let spawned = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn();

        match spawned {
            Ok(mut child) => {
                let program = self.program.clone();
                tokio::spawn(async move {
                    if let Err(e) = child.wait().await {
                        tracing::debug!(program = %program, error = %e, "TTS process wait failed");
                    }
                });
            }
            Err(e) => {
                tracing::warn!(program = %self.program, error = %e, "Failed to start TTS command");
            }
        }
    }
}

/// Recognises speech by running an STT program and reading its stdout.
pub struct CommandSpeechInput {
    program: String,
    args: Vec<String>,
}

impl CommandSpeechInput {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl SpeechInput for CommandSpeechInput {
    async fn recognize(&self) -> Result<String, ChatError> {
        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(std::process::Stdio::null())
            .output()
            .await
            .map_err(|e| ChatError::VoiceError(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(ChatError::VoiceError(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

// =============================================================================
// Tests
// =============================================================================
