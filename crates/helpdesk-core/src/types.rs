use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// UTC timestamp used across all Helpdesk types.
pub type Timestamp = DateTime<Utc>;

// =============================================================================
// Enums
// =============================================================================

/// Author of a transcript message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Text typed or dictated by the person using the assistant.
    User,
    /// Text produced by the generative backend, or the fallback reply.
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

// =============================================================================
// Message
// =============================================================================

/// One entry of a chat transcript.
///
/// Messages are immutable once created. `id` is an ordinal assigned by the
/// owning orchestrator and is never reused within that orchestrator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub role: Role,
    pub text: String,
    pub created_at: Timestamp,
}

impl Message {
    /// Create a user message stamped with the current time.
    pub fn user(id: u64, text: impl Into<String>) -> Self {
        Self::new(id, Role::User, text)
    }

    /// Create an assistant message stamped with the current time.
    pub fn assistant(id: u64, text: impl Into<String>) -> Self {
        Self::new(id, Role::Assistant, text)
    }

    fn new(id: u64, role: Role, text: impl Into<String>) -> Self {
        Self {
            id,
            role,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}
