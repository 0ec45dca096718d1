//! Stripe API types.

use serde::Deserialize;

/// Stripe Checkout session object.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Session ID.
    pub id: String,
    /// Checkout URL to redirect the user to.
    #[serde(default)]
    pub url: Option<String>,
    /// Payment status (`paid`, `unpaid`, `no_payment_required`).
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Client reference ID (our user ID).
    #[serde(default)]
    pub client_reference_id: Option<String>,
    /// Metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Webhook event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    /// Event ID.
    pub id: String,
    /// Event type, e.g. `checkout.session.completed`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event payload.
    pub data: StripeEventData,
}

/// Event data container.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    /// The object the event is about.
    pub object: serde_json::Value,
}

/// Stripe error response.
#[derive(Debug, Deserialize)]
pub struct StripeErrorResponse {
    /// Error details.
    pub error: StripeErrorDetail,
}

/// Stripe error details.
#[derive(Debug, Deserialize)]
pub struct StripeErrorDetail {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_checkout_completed_event() {
        let event: StripeEvent = serde_json::from_str(
            r#"{
                "id": "evt_1",
                "type": "checkout.session.completed",
                "data": {"object": {"id": "cs_1", "metadata": {"userId": "u1", "credits": "50"}}}
            }"#,
        )
        .unwrap();

        assert_eq!(event.event_type, "checkout.session.completed");
        let session: CheckoutSession = serde_json::from_value(event.data.object).unwrap();
        assert_eq!(session.id, "cs_1");
        assert_eq!(session.metadata["userId"], "u1");
        assert!(session.payment_status.is_none());
    }
}
