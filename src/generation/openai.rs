//! OpenAI chat-completion implementation.

use super::Generator;
use crate::error::{Result, SigmaError};
use crate::openai::create_client_with_timeout;
use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Generator backed by the OpenAI chat completions API.
///
/// The assembled prompt is sent as a single user message.
pub struct OpenAIGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
}

impl OpenAIGenerator {
    pub fn new(model: &str, temperature: Option<f32>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(timeout)?,
            model: model.to_string(),
            temperature,
        })
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| SigmaError::Generation(e.to_string()))?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.model).messages(vec![message.into()]);
        if let Some(temperature) = self.temperature {
            builder.temperature(temperature);
        }
        let request = builder
            .build()
            .map_err(|e| SigmaError::Generation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| SigmaError::Generation(format!("OpenAI completion error: {}", e)))?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SigmaError::Generation("Empty response from LLM".to_string()))?;

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }
}
