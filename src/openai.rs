//! OpenAI client configuration with sensible defaults.

use crate::error::{Result, SigmaError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Client::with_config(OpenAIConfig::default()).with_http_client(http_client))
}

/// Check whether an OpenAI API key is present in the environment.
pub fn is_api_key_configured() -> bool {
    std::env::var("OPENAI_API_KEY").is_ok_and(|key| !key.trim().is_empty())
}

/// Fail early with a readable message when the key is missing.
pub fn require_api_key(purpose: &str) -> Result<()> {
    if is_api_key_configured() {
        Ok(())
    } else {
        Err(SigmaError::Config(format!(
            "OPENAI_API_KEY is not set but {} uses the OpenAI provider",
            purpose
        )))
    }
}
