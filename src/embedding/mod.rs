//! Embedding generation for semantic search and retrieval.

mod ollama;
mod openai;

pub(crate) use ollama::api_endpoint;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAIEmbedder;

use crate::config::{Provider, Settings};
use crate::error::{Result, SigmaError};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embeddings for multiple texts, one vector per text, same order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SigmaError::Embedding("Empty embedding response".to_string()))
    }
}

/// Build the embedder selected in the settings.
pub fn create_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    let timeout = settings.request_timeout();
    let embedding = &settings.embedding;

    Ok(match embedding.provider {
        Provider::Ollama => Arc::new(OllamaEmbedder::new(
            &embedding.base_url,
            &embedding.model,
            timeout,
        )?),
        Provider::OpenAI => {
            crate::openai::require_api_key("embedding")?;
            Arc::new(OpenAIEmbedder::with_config(
                &embedding.model,
                embedding.dimensions,
                timeout,
            )?)
        }
    })
}

/// Provider responses must carry exactly one vector per input.
pub(crate) fn check_count(expected: usize, embeddings: &[Vec<f32>]) -> Result<()> {
    if embeddings.len() != expected {
        return Err(SigmaError::Embedding(format!(
            "Expected {} embeddings, provider returned {}",
            expected,
            embeddings.len()
        )));
    }
    Ok(())
}
