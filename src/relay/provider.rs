//! Completion provider chain: primary backend, optional fallback, apology.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

/// Reply text used when every provider attempt fails. User-safe; never
/// leaks the underlying error.
pub const APOLOGY: &str = "I apologize, but I'm having trouble processing your request \
at the moment. Could you please try again or rephrase your question?";

/// A text-generation backend.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Short backend name for log lines.
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, String>;
}

/// Where a reply's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Primary,
    Fallback,
    ErrorPlaceholder,
}

/// A reply ready for delivery. Produced once, consumed once.
#[derive(Debug, Clone)]
pub struct GeneratedReply {
    pub text: String,
    pub source: ReplySource,
}

/// Primary backend with at most one fallback attempt.
pub struct CompletionProvider {
    primary: Arc<dyn CompletionBackend>,
    fallback: Option<Arc<dyn CompletionBackend>>,
}

impl CompletionProvider {
    pub fn new(
        primary: Arc<dyn CompletionBackend>,
        fallback: Option<Arc<dyn CompletionBackend>>,
    ) -> Self {
        Self { primary, fallback }
    }

    /// Generate reply text for a prompt. At most two backend attempts,
    /// then the fixed apology; never returns an error.
    pub async fn complete(&self, prompt: &str, max_tokens: u32) -> GeneratedReply {
        if let Some(text) = attempt(self.primary.as_ref(), prompt, max_tokens).await {
            return GeneratedReply {
                text,
                source: ReplySource::Primary,
            };
        }

        if let Some(ref fallback) = self.fallback {
            if let Some(text) = attempt(fallback.as_ref(), prompt, max_tokens).await {
                return GeneratedReply {
                    text,
                    source: ReplySource::Fallback,
                };
            }
        }

        warn!("All completion attempts failed, replying with placeholder");
        GeneratedReply {
            text: APOLOGY.to_string(),
            source: ReplySource::ErrorPlaceholder,
        }
    }
}

/// One backend attempt. Empty completions count as failures so a blank
/// reply never reaches the chat.
async fn attempt(backend: &dyn CompletionBackend, prompt: &str, max_tokens: u32) -> Option<String> {
    match backend.complete(prompt, max_tokens).await {
        Ok(text) if !text.trim().is_empty() => {
            let preview: String = text.chars().take(50).collect();
            info!("Generated response via {}: {preview}...", backend.name());
            Some(text)
        }
        Ok(_) => {
            warn!("{} returned an empty completion", backend.name());
            None
        }
        Err(e) => {
            warn!("Error generating response via {}: {e}", backend.name());
            None
        }
    }
}
