//! Prompt assembly: instructions + context + user text.

use helpdesk_core::config::ChatConfig;

/// Renders the full prompt sent to the generative backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBuilder {
    instructions: String,
    guidance: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::from_config(&ChatConfig::default(), "LuxDev HQ")
    }
}

impl PromptBuilder {
    pub fn new(instructions: impl Into<String>, guidance: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            guidance: guidance.into(),
        }
    }

    /// Build from `[chat]`, substituting `{organisation}` in the instructions.
    pub fn from_config(config: &ChatConfig, organisation: &str) -> Self {
        Self::new(
            config.instructions.replace("{organisation}", organisation),
            config.guidance.clone(),
        )
    }

    /// Assemble the prompt for one user question.
    ///
    /// Context lines are trimmed and blank lines dropped; an empty context
    /// still yields the section header so the layout never changes.
    pub fn build(&self, context: &str, text: &str) -> String {
        let context = context
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "{}\n\nContext:\n{}\n\nUser Question:\n{}\n\n{}",
            self.instructions,
            context,
            text.trim(),
            self.guidance
        )
    }
}
