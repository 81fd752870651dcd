//! Grounding context suppliers.
//!
//! A supplier produces the block of institution facts that is placed in every
//! prompt. Suppliers may fail; the orchestrator turns a failure into an empty
//! context rather than blocking a submission.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use helpdesk_core::config::{ContextConfig, ContextSource};

use crate::error::ChatError;

/// Source of the context snippet used to ground model answers.
#[async_trait]
pub trait ContextSupplier: Send + Sync {
    async fn fetch(&self) -> Result<String, ChatError>;
}

/// Build the supplier selected by `[context]`.
pub fn from_config(config: &ContextConfig) -> Arc<dyn ContextSupplier> {
    match config.source {
        ContextSource::Static => Arc::new(StaticContext::new(config.text.clone())),
        ContextSource::File => Arc::new(FileContext::new(&config.path)),
    }
}

// =============================================================================
// StaticContext
// =============================================================================

/// Fixed context text.
#[derive(Debug, Clone)]
pub struct StaticContext {
    text: String,
}

impl StaticContext {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl ContextSupplier for StaticContext {
    async fn fetch(&self) -> Result<String, ChatError> {
        Ok(self.text.clone())
    }
}

// =============================================================================
// FileContext
// =============================================================================

/// Context read from a text file on every fetch.
#[derive(Debug, Clone)]
pub struct FileContext {
    path: PathBuf,
}

impl FileContext {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ContextSupplier for FileContext {
    async fn fetch(&self) -> Result<String, ChatError> {
        if self.path.as_os_str().is_empty() {
            return Err(ChatError::ContextUnavailable(
                "no context file configured".to_string(),
            ));
        }
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ChatError::ContextUnavailable(format!("{}: {}", self.path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_static_context_returns_text() {
        let ctx = StaticContext::new("Blog: https://example.org/blog");
        assert_eq!(ctx.fetch().await.unwrap(), "Blog: https://example.org/blog");
    }

    #[tokio::test]
    async fn test_file_context_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Admissions open in March.").unwrap();

        let ctx = FileContext::new(file.path());
        assert_eq!(ctx.fetch().await.unwrap(), "Admissions open in March.");
    }

    #[tokio::test]
    async fn test_file_context_missing_file() {
        let ctx = FileContext::new("/nonexistent/helpdesk/context.txt");
        let err = ctx.fetch().await.unwrap_err();
        assert!(matches!(err, ChatError::ContextUnavailable(_)));
        assert!(err.to_string().contains("context.txt"));
    }

    #[tokio::test]
    async fn test_file_context_empty_path() {
        let ctx = FileContext::new("");
        assert!(matches!(
            ctx.fetch().await,
            Err(ChatError::ContextUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_from_config_static() {
        let config = ContextConfig::default();
        let supplier = from_config(&config);
        assert_eq!(supplier.fetch().await.unwrap(), config.text);
    }

    #[tokio::test]
    async fn test_from_config_file_without_path_fails() {
        let config = ContextConfig {
            source: ContextSource::File,
            ..ContextConfig::default()
        };
        assert!(from_config(&config).fetch().await.is_err());
    }
}
