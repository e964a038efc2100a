//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and credentials are available
//! before starting operations that would otherwise fail midway.

use crate::config::{Provider, Settings};
use crate::error::{Result, SigmaError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingestion needs ffmpeg and the Whisper API, plus an embedder.
    Ingest,
    /// Answering and quizzes need an embedder and a generator.
    Ask,
    /// Search needs an embedder.
    Search,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    let embeds_with_openai = settings.embedding.provider == Provider::OpenAI;
    let generates_with_openai = settings.generation.provider == Provider::OpenAI;

    match operation {
        Operation::Ingest => {
            check_api_key()?;
            check_tool("ffmpeg")?;
            check_tool("ffprobe")?;
        }
        Operation::Ask if embeds_with_openai || generates_with_openai => check_api_key()?,
        Operation::Search if embeds_with_openai => check_api_key()?,
        Operation::Ask | Operation::Search => {}
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    if crate::openai::is_api_key_configured() {
        Ok(())
    } else {
        Err(SigmaError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        ))
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("-version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(SigmaError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SigmaError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(SigmaError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_providers_need_nothing_for_search_and_ask() {
        let settings = Settings::default();
        assert!(check(Operation::Search, &settings).is_ok());
        assert!(check(Operation::Ask, &settings).is_ok());
    }

    #[test]
    fn test_missing_tool_is_reported() {
        let err = check_tool("sigma-definitely-not-installed").unwrap_err();
        assert!(matches!(err, SigmaError::ToolNotFound(name) if name == "sigma-definitely-not-installed"));
    }
}
