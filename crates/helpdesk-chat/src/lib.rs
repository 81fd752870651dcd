//! Conversation orchestration for the Helpdesk assistant.
//!
//! Turns one user utterance into one appended exchange: the user message is
//! recorded immediately, the prompt is assembled from instructions, grounding
//! context and the user's text, and the generative backend's reply (or a
//! fixed fallback) is appended once the call settles.

pub mod backend;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod prompt;
pub mod voice;

pub use backend::{GenerativeBackend, MockBackend};
pub use context::{ContextSupplier, FileContext, StaticContext};
pub use error::ChatError;
pub use orchestrator::{ConversationOrchestrator, SubmitOutcome};
pub use prompt::PromptBuilder;
pub use voice::{
    CommandSpeechInput, CommandSpeechOutput, Speech, SpeechInput, SpeechOutput, VoiceInterface,
};
