//! Ollama embeddings implementation (`POST /api/embed`).

use super::{check_count, Embedder};
use crate::error::{Result, SigmaError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Embedder backed by a local Ollama server.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    endpoint: Url,
    model: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Resolve an Ollama API path against `base_url`, keeping any path prefix on the base.
pub(crate) fn api_endpoint(base_url: &str, path: &str) -> Result<Url> {
    let mut base = Url::parse(base_url)
        .map_err(|e| SigmaError::Config(format!("Invalid Ollama URL '{}': {}", base_url, e)))?;
    if !base.path().ends_with('/') {
        let prefixed = format!("{}/", base.path());
        base.set_path(&prefixed);
    }
    base.join(path)
        .map_err(|e| SigmaError::Config(format!("Invalid Ollama URL '{}': {}", base_url, e)))
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let endpoint = api_endpoint(base_url, "api/embed")?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    #[instrument(skip(self, texts), fields(count = texts.len(), model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Requesting embeddings from {}", self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| SigmaError::Embedding(format!("Ollama request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SigmaError::Embedding(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| SigmaError::Embedding(format!("Malformed Ollama response: {}", e)))?;

        check_count(texts.len(), &parsed.embeddings)?;
        debug!("Generated {} embeddings", parsed.embeddings.len());
        Ok(parsed.embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spawn_json_server;

    #[test]
    fn test_endpoint_joins_base_url() {
        let embedder =
            OllamaEmbedder::new("http://localhost:11434", "bge-m3", Duration::from_secs(5)).unwrap();
        assert_eq!(embedder.endpoint.as_str(), "http://localhost:11434/api/embed");

        assert!(OllamaEmbedder::new("not a url", "bge-m3", Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        assert_eq!(
            api_endpoint("http://host/ollama", "api/embed").unwrap().as_str(),
            "http://host/ollama/api/embed"
        );
        assert_eq!(
            api_endpoint("http://host/ollama/", "api/generate").unwrap().as_str(),
            "http://host/ollama/api/generate"
        );
    }

    #[tokio::test]
    async fn test_embed_batch_parses_response() {
        let base = spawn_json_server(
            "/api/embed",
            serde_json::json!({ "model": "bge-m3", "embeddings": [[0.5, 0.25], [1.0, 0.0]] }),
        )
        .await;

        let embedder = OllamaEmbedder::new(&base, "bge-m3", Duration::from_secs(5)).unwrap();
        let vectors = embedder
            .embed_batch(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors, vec![vec![0.5, 0.25], vec![1.0, 0.0]]);
    }

    #[tokio::test]
    async fn test_count_mismatch_is_an_error() {
        let base = spawn_json_server(
            "/api/embed",
            serde_json::json!({ "embeddings": [[0.5, 0.25]] }),
        )
        .await;

        let embedder = OllamaEmbedder::new(&base, "bge-m3", Duration::from_secs(5)).unwrap();
        let err = embedder
            .embed_batch(&["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, SigmaError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_malformed_response_is_an_error() {
        let base = spawn_json_server("/api/embed", serde_json::json!({ "error": "model not found" })).await;

        let embedder = OllamaEmbedder::new(&base, "missing", Duration::from_secs(5)).unwrap();
        let err = embedder.embed("hello").await.unwrap_err();
        assert!(err.is_upstream());
    }
}
