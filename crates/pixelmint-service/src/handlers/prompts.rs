//! Suggested prompt handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use rand::Rng;

use pixelmint_core::SuggestedPrompt;

use crate::error::ApiError;
use crate::state::AppState;

/// Return one suggested prompt chosen uniformly at random.
pub async fn random_prompt(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SuggestedPrompt>, ApiError> {
    let count = state.store.suggested_prompt_count().await?;
    if count == 0 {
        return Err(ApiError::EmptyDataset("No suggested prompts available".into()));
    }

    let index = rand::thread_rng().gen_range(0..count);
    state
        .store
        .suggested_prompt_at(index)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::EmptyDataset("No suggested prompts available".into()))
}
