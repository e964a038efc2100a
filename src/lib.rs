//! Sigma - course video assistant
//!
//! A retrieval-augmented question answering backend over course video transcripts.
//!
//! # Overview
//!
//! Sigma allows you to:
//! - Ask questions about the course and get answers citing video numbers and timestamps
//! - Steer answers by language (English, Hindi, Marathi) and intent (explain, code, debug, compare)
//! - Generate multiple-choice quizzes from the course material
//! - Upload new videos that are transcribed, chunked, embedded and added to the corpus
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Settings and prompt templates
//! - `audio` - ffmpeg helpers for audio extraction and splitting
//! - `transcription` - Speech-to-text segments
//! - `chunking` - Merging segments into size-bounded passages
//! - `embedding` - Embedding providers
//! - `generation` - Text generation providers
//! - `corpus` - Passage collection, cosine ranking and snapshot persistence
//! - `rag` - Prompt assembly, question answering and quizzes
//! - `orchestrator` - Component wiring and ingestion
//!
//! # Example
//!
//! ```rust,no_run
//! use sigma::config::Settings;
//! use sigma::orchestrator::Orchestrator;
//! use sigma::rag::{Intent, Language};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let answer = orchestrator
//!         .rag()
//!         .ask("How does flexbox align items?", Language::En, Intent::Explain)
//!         .await?;
//!     println!("{}", answer.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod transcription;

#[cfg(test)]
mod testing;

pub use error::{Result, SigmaError};
