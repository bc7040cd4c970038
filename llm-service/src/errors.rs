//! Unified error types for `llm-service`.
//!
//! All provider clients and the facade surface a single [`LlmError`].
//! Configuration loading has its own [`ConfigError`], folded into
//! [`LlmError`] via `From`.

use reqwest::StatusCode;
use thiserror::Error;

/// Result alias for LLM operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Top-level error for provider clients and the facade.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Configuration problem (missing/invalid environment, bad endpoint).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Transport/HTTP client error.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-successful HTTP status from upstream.
    #[error("unexpected HTTP status {status} from {url}: {snippet}")]
    HttpStatus {
        /// Numeric HTTP status code.
        status: StatusCode,
        /// Request URL.
        url: String,
        /// Short snippet of the response body.
        snippet: String,
    },

    /// Unexpected/invalid JSON response.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The response carried no usable payload (e.g. empty `choices`).
    #[error("empty response from provider: {0}")]
    EmptyResponse(&'static str),
}

/// Errors raised while loading provider configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing or empty.
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A numeric environment variable failed to parse.
    #[error("invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name.
        var: &'static str,
        /// Human-readable reason.
        reason: &'static str,
    },

    /// `LLM_KIND` names a provider this crate does not support.
    #[error("unsupported provider kind: {0}")]
    UnsupportedProvider(String),

    /// Endpoint is empty or does not start with http:// or https://.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The selected provider requires an API key and none was configured.
    #[error("missing API key for provider {0}")]
    MissingApiKey(&'static str),
}

/// Reads a mandatory environment variable, trimming whitespace.
///
/// # Errors
/// [`ConfigError::MissingVar`] if unset or empty.
pub fn must_env(name: &'static str) -> std::result::Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

/// Reads an optional `u32` environment variable.
///
/// Unset or empty yields `Ok(None)`; a present but unparsable value is an error.
pub fn env_opt_u32(name: &'static str) -> std::result::Result<Option<u32>, ConfigError> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber {
                var: name,
                reason: "expected u32",
            }),
        _ => Ok(None),
    }
}

/// Truncates an upstream response body for error messages.
pub(crate) fn make_snippet(text: &str) -> String {
    text.chars().take(240).collect()
}

/// Validates that an endpoint uses an http(s) scheme.
pub(crate) fn check_endpoint(endpoint: &str) -> std::result::Result<String, ConfigError> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() || !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidEndpoint(endpoint.to_string()));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
