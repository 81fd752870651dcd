use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::{Role, Timestamp};

/// Domain events emitted by conversations and the session gate.
///
/// Published on a `tokio::sync::broadcast` channel owned by the binary and
/// consumed by the event log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DomainEvent {
    /// A message was appended to a surface's transcript.
    MessageAppended {
        surface: String,
        message_id: u64,
        role: Role,
        timestamp: Timestamp,
    },

    /// A surface's transcript was cleared.
    ConversationReset {
        surface: String,
        generation: u64,
        timestamp: Timestamp,
    },

    /// A backend response arrived after a reset and was dropped.
    ResponseDiscarded {
        surface: String,
        generation: u64,
        timestamp: Timestamp,
    },

    /// A user signed in.
    SessionStarted { email: String, timestamp: Timestamp },

    /// The session ended and every registered conversation was reset.
    SessionEnded {
        conversations_reset: usize,
        timestamp: Timestamp,
    },
}

impl DomainEvent {
    pub fn message_appended(surface: &str, message_id: u64, role: Role) -> Self {
        DomainEvent::MessageAppended {
            surface: surface.to_string(),
            message_id,
            role,
            timestamp: Utc::now(),
        }
    }

    pub fn conversation_reset(surface: &str, generation: u64) -> Self {
        DomainEvent::ConversationReset {
            surface: surface.to_string(),
            generation,
            timestamp: Utc::now(),
        }
    }

    pub fn response_discarded(surface: &str, generation: u64) -> Self {
        DomainEvent::ResponseDiscarded {
            surface: surface.to_string(),
            generation,
            timestamp: Utc::now(),
        }
    }

    pub fn session_started(email: &str) -> Self {
        DomainEvent::SessionStarted {
            email: email.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn session_ended(conversations_reset: usize) -> Self {
        DomainEvent::SessionEnded {
            conversations_reset,
            timestamp: Utc::now(),
        }
    }

    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            DomainEvent::MessageAppended { timestamp, .. }
            | DomainEvent::ConversationReset { timestamp, .. }
            | DomainEvent::ResponseDiscarded { timestamp, .. }
            | DomainEvent::SessionStarted { timestamp, .. }
            | DomainEvent::SessionEnded { timestamp, .. } => *timestamp,
        }
    }

    /// Returns a machine-readable event name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            DomainEvent::MessageAppended { .. } => "message_appended",
            DomainEvent::ConversationReset { .. } => "conversation_reset",
            DomainEvent::ResponseDiscarded { .. } => "response_discarded",
            DomainEvent::SessionStarted { .. } => "session_started",
            DomainEvent::SessionEnded { .. } => "session_ended",
        }
    }
}
