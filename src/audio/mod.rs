//! Audio extraction and splitting for uploaded media.
//!
//! Thin wrappers around ffmpeg and ffprobe.

mod ffmpeg;

pub use ffmpeg::{extract_audio, probe_duration, split_audio};
