//! Checkout session handler.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use pixelmint_core::CreditPackage;

use crate::auth::AuthUser;
use crate::error::{ApiError, UpstreamKind};
use crate::state::AppState;
use crate::stripe::CheckoutRequest;

/// Checkout response.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Hosted payment page to redirect the buyer to.
    pub url: String,
    /// Stripe session ID.
    pub session_id: String,
}

/// Start a hosted checkout for one credit package.
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(credits): Path<String>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let package = credits
        .parse::<i64>()
        .map_err(|_| ApiError::Validation(format!("Invalid credit package: {credits}")))
        .and_then(|n| {
            CreditPackage::try_from(n).map_err(|e| ApiError::Validation(e.to_string()))
        })?;

    let provider = state
        .checkout
        .as_deref()
        .ok_or_else(|| ApiError::Configuration("Stripe is not configured".into()))?;

    let price_id = state
        .config
        .stripe_prices
        .for_package(package)
        .ok_or_else(|| {
            ApiError::Configuration(format!("No Stripe price configured for {credits} credits"))
        })?;

    let host = state
        .config
        .host
        .as_deref()
        .ok_or_else(|| ApiError::Configuration("HOST is not configured".into()))?;

    let success_url = format!("{host}/");
    let cancel_url = format!("{host}/buy");
    let user_id = auth.user_id.to_string();

    let session = provider
        .create_checkout_session(&CheckoutRequest {
            user_id: &user_id,
            price_id,
            credits: package.credits(),
            success_url: &success_url,
            cancel_url: &cancel_url,
        })
        .await
        .map_err(|e| {
            tracing::error!(user_id = %user_id, error = %e, "Failed to create checkout session");
            ApiError::from(e)
        })?;

    let url = session.url.ok_or_else(|| ApiError::Upstream {
        kind: UpstreamKind::Response,
        message: "Checkout session has no URL".into(),
    })?;

    tracing::info!(
        user_id = %user_id,
        credits = package.credits(),
        session_id = %session.id,
        "Checkout session created"
    );

    Ok(Json(CheckoutResponse {
        url,
        session_id: session.id,
    }))
}
