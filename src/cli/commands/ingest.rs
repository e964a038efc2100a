//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::{Context, Result};
use std::path::Path;

/// Run the ingest command.
pub async fn run_ingest(
    file: &str,
    title: Option<&str>,
    number: Option<i64>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let path = Path::new(file);
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file);

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner(&format!("Transcribing and indexing {}...", file_name));
    let result = match number {
        Some(n) => orchestrator.ingest_course(&bytes, file_name, title, n).await,
        None => orchestrator.ingest(&bytes, file_name, title).await,
    };
    spinner.finish_and_clear();

    match result {
        Ok(result) => {
            Output::success(&format!(
                "Indexed '{}' as {} passages",
                result.title, result.chunk_count
            ));
            Output::kv("Media ID", &result.id);
            Output::kv("Corpus size", &orchestrator.corpus().len().to_string());
        }
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
