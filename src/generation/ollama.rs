//! Ollama completion implementation (`POST /api/generate`, non-streaming).

use super::Generator;
use crate::embedding::api_endpoint;
use crate::error::{Result, SigmaError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Generator backed by a local Ollama server.
pub struct OllamaGenerator {
    client: reqwest::Client,
    endpoint: Url,
    model: String,
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaGenerator {
    pub fn new(
        base_url: &str,
        model: &str,
        temperature: Option<f32>,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint = api_endpoint(base_url, "api/generate")?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            model: model.to_string(),
            temperature,
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: self.temperature.map(|temperature| GenerateOptions { temperature }),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| SigmaError::Generation(format!("Ollama request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SigmaError::Generation(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| SigmaError::Generation(format!("Malformed Ollama response: {}", e)))?;

        debug!("Generated {} characters", parsed.response.len());
        Ok(parsed.response)
    }
}
