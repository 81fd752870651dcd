//! Error types for the conversational interface.

/// Errors from the chat engine.
///
/// None of these reach the caller of `ConversationOrchestrator::submit` as an
/// `Err`: input and concurrency rejections are reported as ignored outcomes,
/// generation failures become the fallback reply, and context failures
/// degrade to an empty context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyInput,
    #[error("a request is already pending")]
    RequestAlreadyPending,
    #[error("generation failed: {0}")]
    GenerationFailed(String),
    #[error("context unavailable: {0}")]
    ContextUnavailable(String),
    #[error("voice error: {0}")]
    VoiceError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyInput.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::RequestAlreadyPending.to_string(),
            "a request is already pending"
        );
        assert_eq!(
            ChatError::GenerationFailed("HTTP 429".to_string()).to_string(),
            "generation failed: HTTP 429"
        );
        assert_eq!(
            ChatError::ContextUnavailable("file missing".to_string()).to_string(),
            "context unavailable: file missing"
        );
        assert_eq!(
            ChatError::VoiceError("microphone unavailable".to_string()).to_string(),
            "voice error: microphone unavailable"
        );
    }

    #[test]
    fn test_chat_error_empty_inner_message() {
        let err = ChatError::GenerationFailed(String::new());
        assert_eq!(err.to_string(), "generation failed: ");
    }

    #[test]
    fn test_chat_error_unicode_inner_message() {
        let err = ChatError::ContextUnavailable("fichier \u{00e9}chou\u{00e9}".to_string());
        assert!(err.to_string().contains("\u{00e9}chou\u{00e9}"));
    }

    #[test]
    fn test_errors_implement_debug() {
        let dbg = format!("{:?}", ChatError::RequestAlreadyPending);
        assert!(dbg.contains("RequestAlreadyPending"));
    }
}
