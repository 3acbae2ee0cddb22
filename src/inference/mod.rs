//! Boundary to the model runtime that produces continuations.

pub mod http;

use anyhow::Result;

pub use http::HttpCompleter;

/// Builds the prompt shared by training pairs and live suggestions.
pub fn build_prompt(subject: &str, text_so_far: &str) -> String {
    format!("[SUBJECT] {subject}\n[TEXT SO FAR] {}", text_so_far.trim())
        .trim()
        .to_string()
}

/// Anything that can continue a prompt with free text.
pub trait Completer: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Suggestion for the text typed so far, trimmed.
pub fn suggest(completer: &dyn Completer, subject: &str, text_so_far: &str) -> Result<String> {
    let prompt = build_prompt(subject, text_so_far);
    log::debug!("generating completion for {prompt:?}");
    let suggestion = completer.complete(&prompt)?;
    Ok(suggestion.trim().to_string())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use anyhow::{Result, anyhow};

    use super::Completer;

    /// Upper-cases the last word of the prompt and records every prompt.
    #[derive(Default)]
    pub struct EchoCompleter {
        pub prompts: Mutex<Vec<String>>,
    }

    impl Completer for EchoCompleter {
        fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let last = prompt.split_whitespace().last().unwrap_or_default();
            Ok(format!("  {}  ", last.to_uppercase()))
        }
    }

    pub struct FailingCompleter;

    impl Completer for FailingCompleter {
        fn complete(&self, _prompt: &str) -> Result<String> {
            Err(anyhow!("model offline"))
        }
    }
}
