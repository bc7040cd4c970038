//! Provider configs loaded strictly from environment variables.
//!
//! Two profiles are defined, one per role:
//!
//! - **Generation** → answer-writing model ([`config_generation`])
//! - **Embedding**  → vector model for retrieval ([`config_embedding`])
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND`       = provider kind (`ollama` default, or `openai`)
//! - `LLM_MAX_TOKENS` = optional max tokens (u32)
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `OLLAMA_MODEL`                = generation model (mandatory)
//! - `EMBEDDING_MODEL`             = embedding model (mandatory)
//!
//! OpenAI-specific:
//! - `OPENAI_API_KEY`  = API key (mandatory)
//! - `OPENAI_MODEL`    = generation model (mandatory)
//! - `EMBEDDING_MODEL` = embedding model (mandatory)
//! - `OPENAI_URL`      = base URL (optional, defaults to `https://api.openai.com`)

use crate::errors::{ConfigError, env_opt_u32, must_env};

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama daemon.
    Ollama,
    /// OpenAI REST API.
    OpenAi,
}

impl LlmProvider {
    /// Resolves the provider from `LLM_KIND` (case-insensitive).
    ///
    /// Unset or empty defaults to [`LlmProvider::Ollama`].
    ///
    /// # Errors
    /// [`ConfigError::UnsupportedProvider`] for an unrecognized kind.
    pub fn from_env() -> Result<Self, ConfigError> {
        let kind = std::env::var("LLM_KIND").unwrap_or_default();
        let kind = kind.trim();
        if kind.is_empty() {
            return Ok(Self::Ollama);
        }
        match kind.to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" | "chatgpt" => Ok(Self::OpenAi),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Universal model configuration shared by all providers.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// Which provider serves this profile.
    pub provider: LlmProvider,
    /// Model identifier (e.g. `qwen3:14b`, `gpt-4o-mini`, `nomic-embed-text`).
    pub model: String,
    /// Base endpoint, scheme included.
    pub endpoint: String,
    /// API key, for providers that require one.
    pub api_key: Option<String>,
    /// Upper bound on generated tokens.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Nucleus sampling cutoff.
    pub top_p: Option<f32>,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
///
/// # Errors
/// - [`ConfigError::MissingVar`] if both are missing
/// - [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is invalid
fn ollama_endpoint() -> Result<String, ConfigError> {
    if let Ok(url) = std::env::var("OLLAMA_URL") {
        if !url.trim().is_empty() {
            return Ok(url);
        }
    }
    if let Ok(port) = std::env::var("OLLAMA_PORT") {
        if !port.trim().is_empty() {
            let _ = port
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "OLLAMA_PORT",
                    reason: "expected u16 (1..=65535)",
                })?;
            return Ok(format!("http://localhost:{port}"));
        }
    }
    Err(ConfigError::MissingVar("OLLAMA_URL or OLLAMA_PORT"))
}

fn openai_endpoint() -> String {
    std::env::var("OPENAI_URL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "https://api.openai.com".to_string())
}

/// Constructs the **generation** profile for the provider named by `LLM_KIND`.
///
/// # Defaults
/// - Ollama: `temperature = Some(0.1)`, `timeout_secs = Some(600)`
/// - OpenAI: `temperature = Some(0.1)`, `timeout_secs = Some(120)`
///
/// Caps temperature low: rule answers should be reproducible, not creative.
///
/// # Errors
/// [`ConfigError`] if mandatory variables are missing or malformed.
pub fn config_generation() -> Result<LlmModelConfig, ConfigError> {
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;
    match LlmProvider::from_env()? {
        LlmProvider::Ollama => Ok(LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: must_env("OLLAMA_MODEL")?,
            endpoint: ollama_endpoint()?,
            api_key: None,
            max_tokens,
            temperature: Some(0.1),
            top_p: None,
            timeout_secs: Some(600),
        }),
        LlmProvider::OpenAi => Ok(LlmModelConfig {
            provider: LlmProvider::OpenAi,
            model: must_env("OPENAI_MODEL")?,
            endpoint: openai_endpoint(),
            api_key: Some(must_env("OPENAI_API_KEY").map_err(|_| {
                ConfigError::MissingApiKey("OpenAI")
            })?),
            max_tokens,
            temperature: Some(0.1),
            top_p: None,
            timeout_secs: Some(120),
        }),
    }
}

/// Constructs the **embedding** profile for the provider named by `LLM_KIND`.
///
/// # Env
/// - `EMBEDDING_MODEL` (required)
///
/// # Defaults
/// - `temperature = Some(0.0)` (deterministic)
/// - `timeout_secs = Some(30)`
///
/// # Errors
/// [`ConfigError`] if mandatory variables are missing or malformed.
pub fn config_embedding() -> Result<LlmModelConfig, ConfigError> {
    let model = must_env("EMBEDDING_MODEL")?;
    match LlmProvider::from_env()? {
        LlmProvider::Ollama => Ok(LlmModelConfig {
            provider: LlmProvider::Ollama,
            model,
            endpoint: ollama_endpoint()?,
            api_key: None,
            max_tokens: None,
            temperature: Some(0.0),
            top_p: None,
            timeout_secs: Some(30),
        }),
        LlmProvider::OpenAi => Ok(LlmModelConfig {
            provider: LlmProvider::OpenAi,
            model,
            endpoint: openai_endpoint(),
            api_key: Some(must_env("OPENAI_API_KEY").map_err(|_| {
                ConfigError::MissingApiKey("OpenAI")
            })?),
            max_tokens: None,
            temperature: Some(0.0),
            top_p: None,
            timeout_secs: Some(30),
        }),
    }
}
