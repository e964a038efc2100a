//! Error types for Sigma.

use thiserror::Error;

/// Library-level error type for Sigma operations.
#[derive(Error, Debug)]
pub enum SigmaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("No transcript available")]
    NoTranscript,

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Answer generation failed: {0}")]
    Generation(String),

    #[error("Embedding dimension mismatch: corpus uses {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Please type a question.")]
    EmptyQuestion,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),
}

impl SigmaError {
    /// Whether the error originates from an external provider (embedding,
    /// generation or speech-to-text service).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            SigmaError::Embedding(_)
                | SigmaError::Generation(_)
                | SigmaError::Transcription(_)
                | SigmaError::Http(_)
                | SigmaError::OpenAI(_)
        )
    }

    /// Message safe to show to an end user.
    pub fn user_message(&self) -> String {
        match self {
            SigmaError::EmptyQuestion | SigmaError::NoTranscript | SigmaError::InvalidInput(_) => {
                self.to_string()
            }
            e if e.is_upstream() => {
                "The assistant is unavailable right now. Please try again later.".to_string()
            }
            _ => "Something went wrong while processing the request.".to_string(),
        }
    }
}

/// Result type alias for Sigma operations.
pub type Result<T> = std::result::Result<T, SigmaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_errors_hide_details() {
        let err = SigmaError::Embedding("connection refused at 10.0.0.3".to_string());
        assert!(err.is_upstream());
        assert!(!err.user_message().contains("10.0.0.3"));
    }

    #[test]
    fn test_input_errors_are_shown_verbatim() {
        assert_eq!(SigmaError::EmptyQuestion.user_message(), "Please type a question.");
        assert_eq!(SigmaError::NoTranscript.user_message(), "No transcript available");
        assert!(!SigmaError::NoTranscript.is_upstream());
    }
}
