//! Completion client configuration parsed from environment variables.

use super::types::LlmError;
use crate::config::parse_or;

pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LLM_MAX_TOKENS: u32 = 500;
pub const DEFAULT_LLM_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_LLM_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_LLM_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self { max_tokens: DEFAULT_LLM_MAX_TOKENS, temperature: DEFAULT_LLM_TEMPERATURE }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// Name of the variable the key was read from; kept for error reporting.
    pub api_key_var: String,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub sampling: Sampling,
    pub timeouts: LlmTimeouts,
}

impl LlmConfig {
    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - the key variable named by `LLM_API_KEY_ENV` (default `OPENAI_API_KEY`)
    ///
    /// Optional:
    /// - `LLM_MODEL`: default `gpt-4o-mini`
    /// - `LLM_BASE_URL`: default OpenAI API base URL
    /// - `LLM_MAX_TOKENS`: default 500
    /// - `LLM_TEMPERATURE`: default 0.7
    /// - `LLM_REQUEST_TIMEOUT_SECS`: default 120
    /// - `LLM_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::MissingApiKey`] if the key variable is unset or blank,
    /// and [`LlmError::ConfigParse`] for an out-of-range temperature.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_lookup(crate::config::env_lookup)
    }

    /// Same as [`LlmConfig::from_env`] with an explicit variable source.
    ///
    /// # Errors
    ///
    /// See [`LlmConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LlmError> {
        let api_key_var = lookup("LLM_API_KEY_ENV")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string());
        let api_key = lookup(&api_key_var)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey { var: api_key_var.clone() })?;

        let model = lookup("LLM_MODEL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string());
        let base_url = lookup("LLM_BASE_URL")
            .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let temperature = parse_or(&lookup, "LLM_TEMPERATURE", DEFAULT_LLM_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(LlmError::ConfigParse(format!("LLM_TEMPERATURE out of range: {temperature}")));
        }
        let sampling = Sampling { max_tokens: parse_or(&lookup, "LLM_MAX_TOKENS", DEFAULT_LLM_MAX_TOKENS), temperature };
        let timeouts = LlmTimeouts {
            request_secs: parse_or(&lookup, "LLM_REQUEST_TIMEOUT_SECS", DEFAULT_LLM_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_or(&lookup, "LLM_CONNECT_TIMEOUT_SECS", DEFAULT_LLM_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { api_key_var, api_key, model, base_url, sampling, timeouts })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
