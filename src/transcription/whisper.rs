//! OpenAI Whisper transcription implementation.

use super::{Transcriber, TranscriptSegment};
use crate::audio::{extract_audio, split_audio};
use crate::config::TranscriptionSettings;
use crate::error::{Result, SigmaError};
use crate::openai::create_client_with_timeout;
use async_openai::types::{AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// OpenAI Whisper-based transcriber.
///
/// Media is first converted to mono MP3, then split into pieces that are
/// transcribed concurrently and stitched back onto one timeline.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    language: Option<String>,
    chunk_duration_seconds: u32,
    max_concurrent_chunks: usize,
}

impl WhisperTranscriber {
    /// Create a new Whisper transcriber with custom configuration.
    pub fn with_config(settings: &TranscriptionSettings, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(timeout)?,
            model: settings.model.clone(),
            language: settings.language.clone(),
            chunk_duration_seconds: settings.chunk_duration_seconds,
            max_concurrent_chunks: settings.max_concurrent_chunks.max(1),
        })
    }

    /// Transcribe a single audio file (no splitting).
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_single(&self, audio_path: &Path) -> Result<Vec<TranscriptSegment>> {
        debug!("Transcribing audio file");

        let file_bytes = tokio::fs::read(audio_path).await?;

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(async_openai::types::AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson);

        if let Some(lang) = &self.language {
            request_builder.language(lang);
        }

        let request = request_builder
            .build()
            .map_err(|e| SigmaError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| SigmaError::Transcription(format!("Whisper API error: {}", e)))?;

        let segments: Vec<TranscriptSegment> = match response.segments {
            Some(segs) => segs
                .iter()
                .map(|s| TranscriptSegment::new(s.start as f64, s.end as f64, s.text.trim()))
                .collect(),
            None if !response.text.trim().is_empty() => vec![TranscriptSegment::new(
                0.0,
                response.duration as f64,
                response.text.trim(),
            )],
            None => Vec::new(),
        };

        debug!("Transcribed {} segments", segments.len());
        Ok(segments)
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self), fields(media_path = %media_path.display()))]
    async fn transcribe(&self, media_path: &Path) -> Result<Vec<TranscriptSegment>> {
        let work_dir = tempfile::tempdir()?;
        let audio_path = work_dir.path().join("audio.mp3");
        extract_audio(media_path, &audio_path).await?;

        let pieces = split_audio(&audio_path, &work_dir.path().join("pieces"), self.chunk_duration_seconds).await?;
        let piece_count = pieces.len();
        info!("Transcribing {} audio pieces with {}", piece_count, self.model);

        let mut results: Vec<(usize, f64, Vec<TranscriptSegment>)> = Vec::with_capacity(piece_count);

        let mut stream = stream::iter(pieces.into_iter().enumerate())
            .map(|(idx, (piece_path, offset))| async move {
                let result = self.transcribe_single(&piece_path).await;
                (idx, offset, result)
            })
            .buffer_unordered(self.max_concurrent_chunks);

        while let Some((idx, offset, result)) = stream.next().await {
            match result {
                Ok(segments) => results.push((idx, offset, segments)),
                Err(e) => {
                    return Err(SigmaError::Transcription(format!(
                        "Piece {} at {:.0}s failed: {}",
                        idx, offset, e
                    )));
                }
            }
        }

        Ok(stitch(results))
    }
}

/// Restores timeline order and shifts each piece's timestamps by its offset.
fn stitch(mut results: Vec<(usize, f64, Vec<TranscriptSegment>)>) -> Vec<TranscriptSegment> {
    results.sort_by_key(|(idx, _, _)| *idx);

    let mut all_segments = Vec::new();
    for (_, offset, mut segments) in results {
        for segment in &mut segments {
            segment.start_seconds += offset;
            segment.end_seconds += offset;
        }
        all_segments.extend(segments);
    }
    all_segments
}
