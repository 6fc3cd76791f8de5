//! LLM — chat-completion adapter for the coaching chat widget.
//!
//! DESIGN
//! ======
//! `CompletionClient` is stateless: each `complete` call issues exactly one
//! request to an OpenAI-compatible `/chat/completions` endpoint with a fixed
//! coaching system prompt prepended to the caller's history. It never retries;
//! the conversation store decides what a failure means for the transcript.
//!
//! The API key is validated at construction so a missing credential surfaces
//! at startup rather than on the first chat message.

pub mod config;
pub mod openai;
pub mod types;

use config::{LlmConfig, Sampling};
pub use types::CompletionChat;
use types::{ChatMessage, LlmError, Role};

/// Coaching persona and response-length guidance sent ahead of every history.
pub const SYSTEM_PROMPT: &str = "You are FitCoach, a friendly and knowledgeable personal fitness coach for a \
fitness-plan service. Help visitors with workouts, nutrition basics, recovery, and motivation. Keep answers \
short: two to four sentences or a brief bulleted list, under 150 words. Be encouraging and practical. \
Do not give medical diagnoses; suggest consulting a professional for injuries or health conditions. \
When it fits, invite the visitor to request their free personalized plan using the form on the page.";

/// Returned when the provider answers successfully but with no usable text.
pub const FALLBACK_REPLY: &str = "I'm sorry, I couldn't come up with a response. Could you rephrase that?";

// =============================================================================
// CLIENT
// =============================================================================

/// Concrete completion client for an OpenAI-compatible provider.
///
/// Configured from environment variables by [`CompletionClient::from_env`].
pub struct CompletionClient {
    inner: openai::OpenAiClient,
    model: String,
    sampling: Sampling,
}

impl CompletionClient {
    /// Build a completion client from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the HTTP client fails.
    pub fn from_env() -> Result<Self, LlmError> {
        let config = LlmConfig::from_env()?;
        Self::new(config)
    }

    /// Build a completion client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::MissingApiKey`] if the key is blank, or an error if
    /// the HTTP client fails to build.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey { var: config.api_key_var });
        }
        let inner = openai::OpenAiClient::new(config.api_key, config.base_url, config.timeouts)?;
        Ok(Self { inner, model: config.model, sampling: config.sampling })
    }

    /// Return the configured model name (e.g. `"gpt-4o-mini"`).
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Prepend the system prompt to `history`.
#[must_use]
pub fn build_messages(history: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::new(Role::System, SYSTEM_PROMPT));
    messages.extend(history.iter().cloned());
    messages
}

#[async_trait::async_trait]
impl CompletionChat for CompletionClient {
    async fn complete(&self, history: &[ChatMessage]) -> Result<String, LlmError> {
        let messages = build_messages(history);
        tracing::debug!(model = %self.model, turns = history.len(), "llm: completion request");
        let reply = self
            .inner
            .chat_completions(&self.model, self.sampling, &messages)
            .await?;
        Ok(reply.unwrap_or_else(|| {
            tracing::warn!(model = %self.model, "llm: completion returned no content; using fallback");
            FALLBACK_REPLY.to_string()
        }))
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
