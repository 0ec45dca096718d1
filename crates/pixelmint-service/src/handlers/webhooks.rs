//! Stripe webhook receiver.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use pixelmint_core::UserId;

use crate::error::ApiError;
use crate::state::AppState;
use crate::stripe::webhook::verify_signature;
use crate::stripe::{CheckoutSession, StripeEvent};

/// Event type that credits the ledger.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was accepted.
    pub received: bool,
}

/// Handle Stripe webhooks.
///
/// The body is taken raw so the signature can be checked over the exact bytes
/// Stripe signed. Anything that fails verification is rejected with 400 and
/// never touches the ledger.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    let secret = state
        .config
        .stripe_webhook_secret
        .as_deref()
        .ok_or_else(|| {
            tracing::error!("Stripe webhook received but no webhook secret is configured");
            ApiError::Configuration("Stripe webhook secret not configured".into())
        })?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Validation("Missing Stripe signature".into()))?;

    verify_signature(&body, signature, secret, chrono::Utc::now().timestamp()).map_err(|e| {
        tracing::warn!(error = %e, "Invalid Stripe webhook signature");
        ApiError::Validation("Invalid webhook signature".into())
    })?;

    let event: StripeEvent = serde_json::from_str(&body)
        .map_err(|e| ApiError::Validation(format!("Invalid webhook payload: {e}")))?;

    tracing::info!(
        event_type = %event.event_type,
        event_id = %event.id,
        "Received Stripe webhook"
    );

    match event.event_type.as_str() {
        CHECKOUT_COMPLETED => handle_checkout_completed(&state, &event).await,
        other => {
            tracing::debug!(event_type = %other, "Ignoring Stripe event");
        }
    }

    Ok(Json(WebhookResponse { received: true }))
}

/// A verified purchase extracted from a completed session.
#[derive(Debug, PartialEq, Eq)]
struct Purchase {
    user_id: UserId,
    credits: i64,
}

/// Why a completed session did not produce a purchase.
#[derive(Debug, PartialEq, Eq)]
enum Skip {
    Unpaid(String),
    Malformed(&'static str),
}

fn purchase_from_session(session: &CheckoutSession) -> Result<Purchase, Skip> {
    if let Some(status) = session.payment_status.as_deref() {
        if status != "paid" && status != "no_payment_required" {
            return Err(Skip::Unpaid(status.to_string()));
        }
    }

    let user_id = session
        .metadata
        .get("userId")
        .and_then(serde_json::Value::as_str)
        .or(session.client_reference_id.as_deref())
        .ok_or(Skip::Malformed("missing metadata.userId"))?
        .parse::<UserId>()
        .map_err(|_| Skip::Malformed("invalid metadata.userId"))?;

    let credits = match session.metadata.get("credits") {
        Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        _ => None,
    }
    .ok_or(Skip::Malformed("missing or invalid metadata.credits"))?;

    if credits <= 0 {
        return Err(Skip::Malformed("non-positive metadata.credits"));
    }

    Ok(Purchase { user_id, credits })
}

async fn handle_checkout_completed(state: &AppState, event: &StripeEvent) {
    let session: CheckoutSession = match serde_json::from_value(event.data.object.clone()) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(event_id = %event.id, error = %e, "Malformed checkout session");
            return;
        }
    };

    let purchase = match purchase_from_session(&session) {
        Ok(purchase) => purchase,
        Err(Skip::Unpaid(status)) => {
            tracing::info!(
                session_id = %session.id,
                payment_status = %status,
                "Checkout session not paid yet, skipping"
            );
            return;
        }
        Err(Skip::Malformed(reason)) => {
            tracing::error!(session_id = %session.id, reason, "Cannot credit checkout session");
            return;
        }
    };

    if let Err(e) = state.store.get_or_create_account(&purchase.user_id).await {
        tracing::error!(
            user_id = %purchase.user_id,
            session_id = %session.id,
            error = %e,
            "Failed to ensure account for purchase"
        );
        return;
    }

    match state
        .store
        .increment_credits(&purchase.user_id, purchase.credits)
        .await
    {
        Ok(balance) => tracing::info!(
            user_id = %purchase.user_id,
            session_id = %session.id,
            credits_added = purchase.credits,
            new_balance = balance,
            "Credits added from Stripe checkout"
        ),
        Err(e) => tracing::error!(
            user_id = %purchase.user_id,
            session_id = %session.id,
            credits = purchase.credits,
            error = %e,
            "Failed to credit purchase"
        ),
    }
}
