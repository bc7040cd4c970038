//! Embedding provider seam.
//!
//! Async is required because real providers (Ollama, OpenAI) perform HTTP
//! requests. The trait keeps the retriever and the embedding pool testable
//! against in-process stubs.

use std::{future::Future, pin::Pin};

use crate::errors::RetrievalError;

/// Provider interface for embedding generation.
///
/// Implement this to plug in another embedding backend.
pub trait EmbeddingsProvider: Send + Sync {
    /// Embeds a single text into one vector.
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RetrievalError>> + Send + 'a>>;
}

/// [`EmbeddingsProvider`] backed by the [`llm_service::LlmService`]
/// embedding profile.
pub struct LlmEmbedder {
    service: std::sync::Arc<llm_service::LlmService>,
}

impl LlmEmbedder {
    /// Wraps a shared LLM service.
    pub fn new(service: std::sync::Arc<llm_service::LlmService>) -> Self {
        Self { service }
    }
}

impl EmbeddingsProvider for LlmEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RetrievalError>> + Send + 'a>> {
        Box::pin(async move { Ok(self.service.embed(text).await?) })
    }
}
