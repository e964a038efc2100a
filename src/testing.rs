//! Test doubles shared by unit tests across the crate.

use crate::corpus::{Passage, PassageSource};
use crate::embedding::Embedder;
use crate::error::{Result, SigmaError};
use crate::generation::Generator;
use crate::transcription::{Transcriber, TranscriptSegment};
use async_trait::async_trait;
use axum::{routing::post, Json, Router};
use std::path::Path;
use std::sync::Mutex;

/// Serve `body` for every POST to `route` on an ephemeral port and return the base URL.
pub async fn spawn_json_server(route: &str, body: serde_json::Value) -> String {
    let app = Router::new().route(
        route,
        post(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Embeds text as keyword counts over a fixed vocabulary, so related texts
/// land close to each other.
pub struct KeywordEmbedder {
    vocabulary: Vec<&'static str>,
}

impl KeywordEmbedder {
    pub fn new(vocabulary: &[&'static str]) -> Self {
        Self {
            vocabulary: vocabulary.to_vec(),
        }
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        self.vocabulary
            .iter()
            .map(|word| lower.matches(word).count() as f32)
            .collect()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }
}

/// Embedder whose provider is always down.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(SigmaError::Embedding("connection refused".to_string()))
    }
}

/// Generator that records every prompt and replies with a canned completion.
pub struct RecordingGenerator {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

/// Transcriber returning a fixed list of segments for any file.
pub struct FixedTranscriber {
    segments: Vec<TranscriptSegment>,
}

impl FixedTranscriber {
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        Self { segments }
    }
}

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, media_path: &Path) -> Result<Vec<TranscriptSegment>> {
        assert!(media_path.exists(), "media should be saved before transcription");
        Ok(self.segments.clone())
    }
}

/// Course passage with the given embedding.
pub fn passage(title: &str, number: i64, text: &str, embedding: Vec<f32>) -> Passage {
    Passage {
        title: title.to_string(),
        number,
        start: 0.0,
        end: 10.0,
        text: text.to_string(),
        embedding,
        source: PassageSource::Course,
    }
}
