//! Pipeline orchestrator for Sigma.
//!
//! Owns the shared corpus and the provider clients, and runs ingestion:
//! media is saved, transcribed, merged into passages, embedded in one batch
//! and appended to the corpus.

use crate::chunking::{ContentChunk, SegmentMerger};
use crate::config::{Prompts, Settings};
use crate::corpus::{Corpus, Passage, PassageSource, SqliteSnapshot, USER_VIDEO_NUMBER};
use crate::embedding::{check_count, create_embedder, Embedder};
use crate::error::{Result, SigmaError};
use crate::generation::{create_generator, Generator};
use crate::rag::RagEngine;
use crate::transcription::{Transcriber, WhisperTranscriber};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The main orchestrator for the Sigma pipeline.
pub struct Orchestrator {
    settings: Settings,
    corpus: Arc<Corpus>,
    transcriber: Arc<dyn Transcriber>,
    embedder: Arc<dyn Embedder>,
    merger: SegmentMerger,
    rag: RagEngine,
    upload_dir: PathBuf,
}

impl Orchestrator {
    /// Create a new orchestrator from settings, loading the corpus snapshot.
    pub fn new(settings: Settings) -> Result<Self> {
        let corpus = Arc::new(Corpus::open(Box::new(SqliteSnapshot::new(
            &settings.snapshot_path(),
        )?))?);

        if !crate::openai::is_api_key_configured() {
            warn!("OPENAI_API_KEY is not set; video uploads will fail to transcribe");
        }
        let transcriber: Arc<dyn Transcriber> = Arc::new(WhisperTranscriber::with_config(
            &settings.transcription,
            settings.request_timeout(),
        )?);
        let embedder = create_embedder(&settings)?;
        let generator = create_generator(&settings)?;

        info!(
            "Using {} embeddings ({}) and {} generation ({})",
            settings.embedding.provider,
            settings.embedding.model,
            settings.generation.provider,
            settings.generation.model
        );

        Self::with_components(settings, corpus, transcriber, embedder, generator)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        corpus: Arc<Corpus>,
        transcriber: Arc<dyn Transcriber>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompt_variables()),
        )?;

        let rag = RagEngine::new(corpus.clone(), embedder.clone(), generator, prompts)
            .with_retrieval(settings.retrieval.clone());

        let upload_dir = settings.upload_dir();
        std::fs::create_dir_all(&upload_dir)?;

        Ok(Self {
            merger: SegmentMerger::new(settings.chunking.max_chars),
            settings,
            corpus,
            transcriber,
            embedder,
            rag,
            upload_dir,
        })
    }

    /// Get a reference to the shared corpus.
    pub fn corpus(&self) -> Arc<Corpus> {
        self.corpus.clone()
    }

    /// Get the question answering engine.
    pub fn rag(&self) -> &RagEngine {
        &self.rag
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Ingest a user upload: passages get the user-video number and source.
    pub async fn ingest(
        &self,
        bytes: &[u8],
        original_filename: &str,
        title: Option<&str>,
    ) -> Result<IngestResult> {
        self.run_ingest(bytes, original_filename, title, None)
            .await
            .map_err(|(_, e)| e)
    }

    /// Ingest a curated course video under its course number.
    pub async fn ingest_course(
        &self,
        bytes: &[u8],
        original_filename: &str,
        title: Option<&str>,
        number: i64,
    ) -> Result<IngestResult> {
        self.run_ingest(bytes, original_filename, title, Some(number))
            .await
            .map_err(|(_, e)| e)
    }

    /// Ingest a user upload and shape the result for the upload endpoint.
    pub async fn upload(
        &self,
        bytes: &[u8],
        original_filename: &str,
        title: Option<&str>,
    ) -> UploadOutcome {
        match self.run_ingest(bytes, original_filename, title, None).await {
            Ok(result) => UploadOutcome {
                success: true,
                video_id: Some(result.id),
                title: Some(result.title),
                chunks: Some(result.chunk_count),
                message: None,
            },
            Err((stage, e)) => {
                warn!("Upload of '{}' failed: {}", original_filename, e);
                UploadOutcome {
                    success: false,
                    video_id: None,
                    title: None,
                    chunks: None,
                    message: Some(stage.message().to_string()),
                }
            }
        }
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn run_ingest(
        &self,
        bytes: &[u8],
        original_filename: &str,
        title: Option<&str>,
        number: Option<i64>,
    ) -> std::result::Result<IngestResult, (IngestStage, SigmaError)> {
        let id = uuid::Uuid::new_v4().to_string();
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(original_filename)
            .to_string();

        // Save
        let media_path = self
            .save_upload(&id, original_filename, bytes)
            .await
            .map_err(|e| (IngestStage::Processing, e))?;
        info!("Saved upload '{}' as {:?}", title, media_path);

        // Transcribe
        let segments = self
            .transcriber
            .transcribe(&media_path)
            .await
            .map_err(|e| (IngestStage::Processing, e))?;
        if segments.is_empty() {
            return Err((IngestStage::Transcript, SigmaError::NoTranscript));
        }
        info!("Transcribed {} segments", segments.len());

        // Chunk
        let chunks = self.merger.merge(&segments);
        if chunks.is_empty() {
            return Err((IngestStage::Transcript, SigmaError::NoTranscript));
        }

        // Embed
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self
            .embedder
            .embed_batch(&texts)
            .await
            .and_then(|embeddings| check_count(texts.len(), &embeddings).map(|_| embeddings))
            .map_err(|e| (IngestStage::Embedding, e))?;

        // Index
        let (number, source) = match number {
            Some(n) => (n, PassageSource::Course),
            None => (USER_VIDEO_NUMBER, PassageSource::UserVideo),
        };
        let passages = build_passages(&title, number, source, chunks, embeddings);
        let chunk_count = passages.len();
        self.corpus
            .append(passages)
            .map_err(|e| (IngestStage::Saving, e))?;

        info!("Indexed '{}' as {} passages", title, chunk_count);

        Ok(IngestResult {
            id,
            title,
            chunk_count,
        })
    }

    async fn save_upload(&self, id: &str, original_filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        let file_name = match Path::new(original_filename)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(ext) => format!("{}.{}", id, ext),
            None => id.to_string(),
        };

        let path = self.upload_dir.join(file_name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}

fn build_passages(
    title: &str,
    number: i64,
    source: PassageSource,
    chunks: Vec<ContentChunk>,
    embeddings: Vec<Vec<f32>>,
) -> Vec<Passage> {
    chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| Passage {
            title: title.to_string(),
            number,
            start: chunk.start_seconds,
            end: chunk.end_seconds,
            text: chunk.text,
            embedding,
            source,
        })
        .collect()
}

/// Pipeline step an ingestion failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Processing,
    Transcript,
    Embedding,
    Saving,
}

impl IngestStage {
    /// User-facing failure message for the stage.
    pub fn message(&self) -> &'static str {
        match self {
            IngestStage::Processing => "Video processing failed.",
            IngestStage::Transcript => "No transcript available.",
            IngestStage::Embedding => "Embedding failed.",
            IngestStage::Saving => "Saving the corpus failed.",
        }
    }
}

/// Result of ingesting media.
#[derive(Debug, Clone)]
pub struct IngestResult {
    /// Generated media ID.
    pub id: String,
    /// Title attached to every passage.
    pub title: String,
    /// Number of passages added.
    pub chunk_count: usize,
}

/// Upload response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
