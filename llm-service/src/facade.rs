//! Shared LLM service with two active profiles: generation and embedding.
//!
//! Construct once, wrap in `Arc`, and pass clones to dependents. Clients are
//! built eagerly at construction so misconfiguration fails up front instead
//! of on the first call.

use tracing::info;

use crate::config::{LlmModelConfig, LlmProvider, config_embedding, config_generation};
use crate::errors::Result;
use crate::services::{OllamaService, OpenAiService};

enum ProviderClient {
    Ollama(OllamaService),
    OpenAi(OpenAiService),
}

impl ProviderClient {
    fn build(cfg: LlmModelConfig) -> Result<Self> {
        match cfg.provider {
            LlmProvider::Ollama => Ok(Self::Ollama(OllamaService::new(cfg)?)),
            LlmProvider::OpenAi => Ok(Self::OpenAi(OpenAiService::new(cfg)?)),
        }
    }

    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        match self {
            Self::Ollama(cli) => cli.generate(prompt, system).await,
            Self::OpenAi(cli) => cli.generate(prompt, system).await,
        }
    }

    async fn embeddings(&self, input: &str) -> Result<Vec<f32>> {
        match self {
            Self::Ollama(cli) => cli.embeddings(input).await,
            Self::OpenAi(cli) => cli.embeddings(input).await,
        }
    }
}

/// Facade over one generation profile and one embedding profile.
pub struct LlmService {
    generation_cfg: LlmModelConfig,
    embedding_cfg: LlmModelConfig,
    generation: ProviderClient,
    embedding: ProviderClient,
}

impl LlmService {
    /// Creates a service from explicit profile configs.
    ///
    /// # Errors
    /// Returns the first client construction failure.
    pub fn new(generation: LlmModelConfig, embedding: LlmModelConfig) -> Result<Self> {
        let generation_client = ProviderClient::build(generation.clone())?;
        let embedding_client = ProviderClient::build(embedding.clone())?;

        info!(
            generation_model = %generation.model,
            embedding_model = %embedding.model,
            "LlmService initialized"
        );

        Ok(Self {
            generation_cfg: generation,
            embedding_cfg: embedding,
            generation: generation_client,
            embedding: embedding_client,
        })
    }

    /// Creates a service from environment variables.
    ///
    /// Shorthand for [`config_generation`] + [`config_embedding`] + [`LlmService::new`].
    ///
    /// # Errors
    /// Propagates config and client construction failures.
    pub fn from_env() -> Result<Self> {
        Self::new(config_generation()?, config_embedding()?)
    }

    /// Generates text with the generation profile.
    ///
    /// `system` carries an optional system instruction; chat-style providers
    /// send it as a dedicated message, others prepend it to the prompt.
    ///
    /// # Errors
    /// Returns [`crate::LlmError`] if generation fails.
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        self.generation.generate(prompt, system).await
    }

    /// Computes an embedding vector with the embedding profile.
    ///
    /// # Errors
    /// Returns [`crate::LlmError`] if embedding fails.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>> {
        self.embedding.embeddings(input).await
    }

    /// Returns the `(generation, embedding)` profile configs.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (&self.generation_cfg, &self.embedding_cfg)
    }
}
