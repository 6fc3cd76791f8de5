//! LLM types — chat messages, the completion trait, and errors.

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Shown in the chat widget when an error carries nothing presentable.
pub const GENERIC_ERROR_MESSAGE: &str = "Sorry, something went wrong. Please try again.";

/// Shown when the coach cannot be used because of its own configuration.
pub const COACH_UNAVAILABLE_MESSAGE: &str = "The coach is not available right now.";

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by completion client operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The API credential is absent or blank.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    /// The HTTP request to the completion service failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The completion service returned a non-success HTTP status.
    ///
    /// `message` is the provider's own `error.message`, when the body had one.
    #[error("API response error: status {status}{}", detail_suffix(.message.as_deref()))]
    ApiResponse { status: u16, message: Option<String> },

    /// The completion service response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

fn detail_suffix(detail: Option<&str>) -> String {
    detail.map(|d| format!(": {d}")).unwrap_or_default()
}

impl LlmError {
    /// Plain-language description suitable for the chat widget.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            // Auth failures echo key and account details; keep them out of the widget.
            Self::ConfigParse(_)
            | Self::MissingApiKey { .. }
            | Self::HttpClientBuild(_)
            | Self::ApiResponse { status: 401 | 403, .. } => COACH_UNAVAILABLE_MESSAGE.into(),
            Self::ApiRequest(_) => "Couldn't reach the coach. Check your connection and try again.".into(),
            Self::ApiResponse { status: 429, .. } => {
                "The coach is busy right now. Please try again in a moment.".into()
            }
            Self::ApiResponse { message: Some(message), .. } if !message.trim().is_empty() => message.trim().to_owned(),
            Self::ApiResponse { .. } | Self::ApiParse(_) => GENERIC_ERROR_MESSAGE.into(),
        }
    }
}

impl ErrorCode for LlmError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigParse(_) => "E_CONFIG_PARSE",
            Self::MissingApiKey { .. } => "E_MISSING_API_KEY",
            Self::ApiRequest(_) => "E_API_REQUEST",
            Self::ApiResponse { .. } => "E_API_RESPONSE",
            Self::ApiParse(_) => "E_API_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::ApiRequest(_) | Self::ApiResponse { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// MESSAGE TYPES
// =============================================================================

/// Speaker of a chat message on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single `{role, content}` message sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

// =============================================================================
// COMPLETION TRAIT
// =============================================================================

/// Async seam between the conversation store and the completion service.
/// Enables mocking in tests.
#[async_trait::async_trait]
pub trait CompletionChat: Send + Sync {
    /// Produce one assistant reply for `history` (oldest first, no system
    /// message; the implementation supplies its own).
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the request fails or the provider reports an
    /// error.
    async fn complete(&self, history: &[ChatMessage]) -> Result<String, LlmError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
