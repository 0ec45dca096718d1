//! Suggested prompt seeding.

use std::path::Path;

use pixelmint_core::SuggestedPrompt;
use pixelmint_store::{Store, StoreError};

/// Errors while seeding suggested prompts.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// The seed file could not be read.
    #[error("failed to read prompt file: {0}")]
    Io(#[from] std::io::Error),

    /// The seed file is not a JSON array of strings.
    #[error("invalid prompt file: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing to the store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Fill an empty suggested-prompt set from `file`, or the built-in defaults.
///
/// Returns how many prompts were written; a non-empty set is left alone.
///
/// # Errors
///
/// Returns an error if the file is unreadable or the store fails.
pub async fn seed_suggested_prompts(store: &dyn Store, file: Option<&Path>) -> Result<usize, SeedError> {
    let existing = store.suggested_prompt_count().await?;
    if existing > 0 {
        tracing::debug!(existing, "Suggested prompts already present");
        return Ok(0);
    }

    let texts: Vec<String> = match file {
        Some(path) => {
            let contents = tokio::fs::read_to_string(path).await?;
            serde_json::from_str(&contents)?
        }
        None => SuggestedPrompt::DEFAULTS
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
    };

    let texts: Vec<String> = texts
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    let written = store.put_suggested_prompts(&texts).await?;
    tracing::info!(written, "Seeded suggested prompts");
    Ok(written)
}
