//! Transcript chunking.
//!
//! Speech-to-text output arrives as many short segments. [`SegmentMerger`]
//! packs consecutive segments into passages that stay under a character
//! budget, which is the unit that gets embedded and cited.

use crate::transcription::TranscriptSegment;
use serde::{Deserialize, Serialize};

/// Default character budget for a merged chunk.
pub const DEFAULT_MAX_CHARS: usize = 400;

/// A merged group of transcript segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentChunk {
    /// Start time in seconds (start of the first merged segment).
    pub start_seconds: f64,
    /// End time in seconds (end of the last merged segment).
    pub end_seconds: f64,
    /// Space-joined segment texts.
    pub text: String,
}

/// Greedy, order-preserving segment merger.
///
/// Segments are appended to the running chunk while the space-joined text stays
/// within `max_chars` (counted in characters, not bytes). A segment that would
/// overflow closes the chunk and seeds the next one. A single segment longer
/// than the budget becomes its own oversized chunk; segments are never split.
#[derive(Debug, Clone, Copy)]
pub struct SegmentMerger {
    max_chars: usize,
}

impl SegmentMerger {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Merge segments into chunks. Empty-text segments are skipped.
    pub fn merge(&self, segments: &[TranscriptSegment]) -> Vec<ContentChunk> {
        let mut chunks = Vec::new();
        let mut buffer = ChunkBuffer::default();

        for segment in segments {
            let text = segment.text.trim();
            if text.is_empty() {
                continue;
            }

            let text_chars = text.chars().count();
            if !buffer.is_empty() && buffer.len_with(text_chars) > self.max_chars {
                chunks.extend(buffer.take());
            }
            buffer.push(segment, text, text_chars);
        }

        chunks.extend(buffer.take());
        chunks
    }
}

impl Default for SegmentMerger {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS)
    }
}

#[derive(Default)]
struct ChunkBuffer {
    text: String,
    chars: usize,
    start: f64,
    end: f64,
}

impl ChunkBuffer {
    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Character length after appending `extra` characters with a joining space.
    fn len_with(&self, extra: usize) -> usize {
        if self.is_empty() {
            extra
        } else {
            self.chars + 1 + extra
        }
    }

    fn push(&mut self, segment: &TranscriptSegment, text: &str, text_chars: usize) {
        if self.is_empty() {
            self.start = segment.start_seconds;
        } else {
            self.text.push(' ');
        }
        self.chars = self.len_with(text_chars);
        self.text.push_str(text);
        self.end = segment.end_seconds;
    }

    fn take(&mut self) -> Option<ContentChunk> {
        if self.is_empty() {
            return None;
        }
        let buffer = std::mem::take(self);
        Some(ContentChunk {
            start_seconds: buffer.start,
            end_seconds: buffer.end,
            text: buffer.text,
        })
    }
}
