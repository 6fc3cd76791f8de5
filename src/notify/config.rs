//! Notification endpoint configuration parsed from environment variables.

use std::time::Duration;

use super::NotifyError;
use crate::config::parse_or;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;
pub const DEFAULT_NOTIFY_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_NOTIFY_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Retry budget for lead delivery. Attempt `k` (1-based) that fails is
/// followed by a wait of `base_delay * k`, except after the last attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Wait before the attempt after failed attempt `attempt`, or `None` when
    /// `attempt` was the last one.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_attempts).then(|| self.base_delay * attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_MAX_ATTEMPTS, base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyConfig {
    pub url: String,
    pub bearer_token: Option<String>,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl NotifyConfig {
    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `NOTIFY_URL`: the lead notification function URL
    ///
    /// Optional:
    /// - `NOTIFY_BEARER_TOKEN`: sent as `Authorization: Bearer …`
    /// - `NOTIFY_MAX_ATTEMPTS`: default 3 (minimum 1)
    /// - `NOTIFY_BASE_DELAY_MS`: default 1000
    /// - `NOTIFY_REQUEST_TIMEOUT_SECS`: default 30
    /// - `NOTIFY_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::MissingUrl`] when `NOTIFY_URL` is unset or blank,
    /// and [`NotifyError::ConfigParse`] when it is not an http(s) URL.
    pub fn from_env() -> Result<Self, NotifyError> {
        Self::from_lookup(crate::config::env_lookup)
    }

    /// Same as [`NotifyConfig::from_env`] with an explicit variable source.
    ///
    /// # Errors
    ///
    /// See [`NotifyConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, NotifyError> {
        let url = lookup("NOTIFY_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(NotifyError::MissingUrl)?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(NotifyError::ConfigParse(format!("NOTIFY_URL must be an http(s) URL: {url}")));
        }
        let bearer_token = lookup("NOTIFY_BEARER_TOKEN")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let retry = RetryPolicy {
            max_attempts: parse_or(&lookup, "NOTIFY_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS).max(1),
            base_delay: Duration::from_millis(parse_or(&lookup, "NOTIFY_BASE_DELAY_MS", DEFAULT_BASE_DELAY_MS)),
        };

        Ok(Self {
            url,
            bearer_token,
            retry,
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "NOTIFY_REQUEST_TIMEOUT_SECS",
                DEFAULT_NOTIFY_REQUEST_TIMEOUT_SECS,
            )),
            connect_timeout: Duration::from_secs(parse_or(
                &lookup,
                "NOTIFY_CONNECT_TIMEOUT_SECS",
                DEFAULT_NOTIFY_CONNECT_TIMEOUT_SECS,
            )),
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
