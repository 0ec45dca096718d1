//! Stripe integration: hosted checkout sessions and webhook events.

mod client;
pub mod types;
pub mod webhook;

use async_trait::async_trait;

pub use client::{StripeClient, StripeError};
pub use types::{CheckoutSession, StripeEvent};

/// Parameters for one hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest<'a> {
    /// Buyer, echoed back in the completion webhook.
    pub user_id: &'a str,
    /// Stripe price for the selected package.
    pub price_id: &'a str,
    /// Credits granted once payment completes.
    pub credits: i64,
    /// Where Stripe sends the buyer after paying.
    pub success_url: &'a str,
    /// Where Stripe sends the buyer after cancelling.
    pub cancel_url: &'a str,
}

/// Creates hosted payment sessions.
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// Create a checkout session and return it.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment processor rejects or never answers
    /// the request.
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest<'_>,
    ) -> Result<CheckoutSession, StripeError>;
}
