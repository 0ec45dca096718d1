//! Image generation workflow.
//!
//! One request runs these steps in order and stops at the first failure:
//! debit one credit, generate, optionally re-host the image, record it. The
//! debit is a conditional decrement, so concurrent requests cannot spend
//! more credits than the account holds. Nothing is retried.
//!
//! [`spawn_create_image`] runs the workflow on its own task: once the credit
//! is spent, a dropped request future cannot skip the refund or the insert.
//! Generation and re-hosting share one deadline, derived from the request
//! timeout, and running out of it counts as an upstream failure.

use std::sync::Arc;

use pixelmint_core::{Image, Prompt, UserId};

use crate::assets::{self, asset_key, PNG_CONTENT_TYPE};
use crate::error::{ApiError, UpstreamKind};
use crate::generation::ImageGenerator;
use crate::state::AppState;

/// Run [`create_image`] on a detached task and wait for its result.
///
/// # Errors
///
/// Everything [`create_image`] returns, plus `ApiError::Internal` if the
/// task panics.
pub async fn spawn_create_image(
    state: Arc<AppState>,
    author: UserId,
    prompt: Prompt,
) -> Result<Image, ApiError> {
    tokio::spawn(async move { create_image(&state, &author, prompt).await })
        .await
        .map_err(|e| ApiError::Internal(format!("generation task failed: {e}")))?
}

/// Spend a credit and turn `prompt` into a stored [`Image`].
///
/// The prompt is already validated and the caller authenticated.
///
/// # Errors
///
/// - `ApiError::Configuration` when no generator is configured.
/// - `ApiError::InsufficientCredits` when the balance is zero; the provider
///   is not called.
/// - `ApiError::Upstream` when generation fails or misses its deadline.
/// - `ApiError::Storage` when re-hosting fails.
pub async fn create_image(
    state: &AppState,
    author: &UserId,
    prompt: Prompt,
) -> Result<Image, ApiError> {
    let generator = state
        .generator
        .as_deref()
        .ok_or_else(|| ApiError::Configuration("Image generation is not configured".into()))?;

    // First-time callers get their starting credit here.
    state.store.get_or_create_account(author).await?;
    let remaining = state.store.decrement_credit(author).await?;
    tracing::info!(user_id = %author, remaining, "Credit spent on generation");

    let deadline = state.config.generation_timeout();
    let rendered = tokio::time::timeout(deadline, render(state, generator, &prompt))
        .await
        .unwrap_or_else(|_| {
            Err(ApiError::Upstream {
                kind: UpstreamKind::Transport,
                message: format!("Image generation timed out after {deadline:?}"),
            })
        });

    let url = match rendered {
        Ok(url) => url,
        Err(err) => {
            tracing::warn!(user_id = %author, error = %err, "Image generation failed");
            if state.config.refund_failed_generations {
                refund(state, author).await;
            }
            return Err(err);
        }
    };

    let image = Image::new(author.clone(), prompt, url);
    state.store.insert_image(&image).await?;

    tracing::info!(user_id = %author, image_id = %image.id, "Image created");
    Ok(image)
}

/// Generate the image and return its final URL.
async fn render(
    state: &AppState,
    generator: &dyn ImageGenerator,
    prompt: &Prompt,
) -> Result<String, ApiError> {
    let provider_url = generator.generate(prompt).await?;

    let Some(store) = state.assets.as_deref() else {
        return Ok(provider_url);
    };

    let bytes = assets::download(&state.http, &provider_url).await?;
    let key = asset_key();
    let url = store.put(&key, bytes, PNG_CONTENT_TYPE).await?;

    tracing::debug!(key = %key, "Generated image re-hosted");
    Ok(url)
}

async fn refund(state: &AppState, author: &UserId) {
    match state.store.increment_credits(author, 1).await {
        Ok(balance) => tracing::info!(user_id = %author, balance, "Refunded failed generation"),
        Err(e) => tracing::error!(user_id = %author, error = %e, "Refund failed"),
    }
}
