//! Notify — transport to the backend function that emails lead plans.
//!
//! DESIGN
//! ======
//! `NotifyTransport` performs exactly one delivery attempt and decodes the
//! endpoint's `{success, message}` body. It does not interpret the `success`
//! flag and never retries; both belong to the dispatcher in
//! `services::dispatch`. `HttpNotifier` is the reqwest implementation.

pub mod config;
pub mod http;

use serde::Deserialize;

use crate::error::ErrorCode;
use crate::lead::LeadPayload;

pub use config::{NotifyConfig, RetryPolicy};
pub use http::HttpNotifier;

/// Longest slice of an error body carried into a failure message.
const MAX_ERROR_BODY_CHARS: usize = 200;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("NOTIFY_URL is not set")]
    MissingUrl,

    #[error("config parse failed: {0}")]
    ConfigParse(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The request never produced a response.
    #[error("network error: {0}")]
    Request(String),

    /// Non-2xx response.
    #[error("HTTP {status}{}", detail_suffix(.body))]
    Status { status: u16, body: String },

    /// 2xx response whose body is not the expected JSON.
    #[error("invalid response body: {0}")]
    InvalidBody(String),

    /// The endpoint answered `success: false`.
    #[error("{0}")]
    Rejected(String),
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() { String::new() } else { format!(": {detail}") }
}

impl NotifyError {
    /// Build a [`NotifyError::Status`] keeping a bounded, trimmed body.
    #[must_use]
    pub fn status(status: u16, body: &str) -> Self {
        let body = body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect();
        Self::Status { status, body }
    }
}

impl ErrorCode for NotifyError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingUrl => "E_NOTIFY_MISSING_URL",
            Self::ConfigParse(_) => "E_CONFIG_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Request(_) => "E_NOTIFY_REQUEST",
            Self::Status { .. } => "E_NOTIFY_STATUS",
            Self::InvalidBody(_) => "E_NOTIFY_BODY",
            Self::Rejected(_) => "E_NOTIFY_REJECTED",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { .. } | Self::InvalidBody(_) | Self::Rejected(_))
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// Decoded notification endpoint body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NotifyResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl NotifyResponse {
    /// Failure reason when `success` is false.
    #[must_use]
    pub fn rejection_reason(&self) -> String {
        self.error
            .as_deref()
            .or(self.message.as_deref())
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or("notification endpoint reported failure")
            .to_owned()
    }
}

// =============================================================================
// TRANSPORT TRAIT
// =============================================================================

/// One delivery attempt. Enables mocking in tests.
#[async_trait::async_trait]
pub trait NotifyTransport: Send + Sync {
    /// Post `payload` once and decode the response body.
    ///
    /// # Errors
    ///
    /// Returns a [`NotifyError`] on network failure, non-2xx status, or an
    /// undecodable body.
    async fn deliver(&self, payload: &LeadPayload) -> Result<NotifyResponse, NotifyError>;
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
