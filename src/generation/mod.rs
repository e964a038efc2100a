//! Text generation for answers and quizzes.

mod ollama;
mod openai;

pub use ollama::OllamaGenerator;
pub use openai::OpenAIGenerator;

use crate::config::{Provider, Settings};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for completion providers. One prompt in, the full completion out.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Build the generator selected in the settings.
pub fn create_generator(settings: &Settings) -> Result<Arc<dyn Generator>> {
    let timeout = settings.request_timeout();
    let generation = &settings.generation;

    Ok(match generation.provider {
        Provider::Ollama => Arc::new(OllamaGenerator::new(
            &generation.base_url,
            &generation.model,
            generation.temperature,
            timeout,
        )?),
        Provider::OpenAI => {
            crate::openai::require_api_key("generation")?;
            Arc::new(OpenAIGenerator::new(
                &generation.model,
                generation.temperature,
                timeout,
            )?)
        }
    })
}
