//! Import command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::corpus::{Corpus, Passage, SqliteSnapshot};
use anyhow::{Context, Result};

/// Run the import command.
pub async fn run_import(file: &str, settings: Settings) -> Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file))?;
    let passages: Vec<Passage> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of passages", file))?;

    if passages.is_empty() {
        Output::warning("No passages to import.");
        return Ok(());
    }

    let corpus = Corpus::open(Box::new(SqliteSnapshot::new(&settings.snapshot_path())?))?;
    let count = passages.len();
    let total = corpus.append(passages)?;

    Output::success(&format!("Imported {} passages ({} in corpus)", count, total));
    Ok(())
}
