//! LLM generation and embedding clients for the rules assistant.
//!
//! Two providers are supported, selected by config:
//! - **Ollama** — local models via `/api/generate` and `/api/embeddings`
//! - **OpenAI** — hosted models via `/v1/chat/completions` and `/v1/embeddings`
//!
//! [`LlmService`] wraps a pair of provider clients (one generation profile,
//! one embedding profile) behind a single async facade. Configs are loaded
//! strictly from environment variables; see [`config`].

pub mod config;
pub mod errors;
pub mod services;

mod facade;

pub use config::{LlmModelConfig, LlmProvider, config_embedding, config_generation};
pub use errors::{ConfigError, LlmError};
pub use facade::LlmService;
