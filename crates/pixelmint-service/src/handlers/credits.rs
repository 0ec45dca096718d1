//! Credit balance handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    /// Current balance.
    pub credits: i64,
}

/// Get the caller's balance, opening the account on first use.
pub async fn get_credits(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<CreditsResponse>, ApiError> {
    let account = state.store.get_or_create_account(&auth.user_id).await?;

    Ok(Json(CreditsResponse {
        credits: account.credits,
    }))
}

/// Spend one credit.
pub async fn decrement_credit(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<CreditsResponse>, ApiError> {
    let credits = state.store.decrement_credit(&auth.user_id).await?;

    tracing::info!(user_id = %auth.user_id, credits, "Credit decremented");
    Ok(Json(CreditsResponse { credits }))
}
