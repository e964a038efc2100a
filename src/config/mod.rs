//! Configuration module for Sigma.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, IntentPrompts, LanguagePrompts, Prompts, QuizPrompts};
pub use settings::{
    ChunkingSettings, CorpusSettings, CourseSettings, EmbeddingSettings, GeneralSettings,
    GenerationSettings, PromptSettings, Provider, RetrievalSettings, ServerSettings, Settings,
    TranscriptionSettings,
};
