//! System prompt rendering for script generation.

use crate::error::{WorkerError, WorkerResult};

const SCRIPT_SYSTEM_TEMPLATE: &str = include_str!("../prompts/script_system.tmpl");

/// Values substituted into the script-generation system prompt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptConfig {
    pub subject: String,
    pub segments: u32,
    pub min_chars: u32,
    pub max_chars: u32,
    pub focus: String,
    pub hook: String,
}

/// Renders `{{name}}` placeholders in a prompt template.
#[derive(Debug, Clone)]
pub struct PromptRenderer {
    template: String,
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new(SCRIPT_SYSTEM_TEMPLATE)
    }
}

impl PromptRenderer {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Render the system prompt. Unknown placeholders are an error.
    pub fn system(&self, config: &PromptConfig) -> WorkerResult<String> {
        if config.subject.trim().is_empty() {
            return Err(WorkerError::invalid_payload("subject is empty"));
        }
        if config.max_chars > 0 && config.min_chars > config.max_chars {
            return Err(WorkerError::invalid_payload(format!(
                "minChars {} exceeds maxChars {}",
                config.min_chars, config.max_chars
            )));
        }

        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find("}}").ok_or_else(|| {
                WorkerError::PromptFailed("unterminated placeholder".to_string())
            })?;
            out.push_str(&lookup(config, after[..end].trim())?);
            rest = &after[end + 2..];
        }
        out.push_str(rest);

        Ok(out.trim().to_string())
    }
}

fn lookup(config: &PromptConfig, name: &str) -> WorkerResult<String> {
    Ok(match name {
        "subject" => config.subject.clone(),
        "segments" => config.segments.to_string(),
        "min_chars" => config.min_chars.to_string(),
        "max_chars" => config.max_chars.to_string(),
        "focus" => config.focus.clone(),
        "hook" => config.hook.clone(),
        other => {
            return Err(WorkerError::PromptFailed(format!(
                "unknown placeholder {{{{{}}}}}",
                other
            )))
        }
    })
}
