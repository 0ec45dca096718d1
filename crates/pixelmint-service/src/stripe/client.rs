//! Stripe API client implementation.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::types::{CheckoutSession, StripeErrorResponse};
use super::{CheckoutProvider, CheckoutRequest};

/// Error type for Stripe operations.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe API returned an error.
    #[error("Stripe API error: {error_type} - {message}")]
    Api {
        /// Error type.
        error_type: String,
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
    },

    /// Invalid webhook signature.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Webhook timestamp outside the accepted window.
    #[error("Webhook timestamp outside tolerance")]
    StaleTimestamp,
}

/// Stripe API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl StripeClient {
    /// Stripe API base URL.
    pub const BASE_URL: &'static str = "https://api.stripe.com";

    /// Create a new Stripe client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Stripe secret API key (`sk_test_...` or `sk_live_...`)
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, StripeError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: Self::BASE_URL.to_string(),
        })
    }

    /// Point the client at a different API host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        match response.json::<StripeErrorResponse>().await {
            Ok(stripe_error) => Err(StripeError::Api {
                error_type: stripe_error.error.error_type,
                message: stripe_error.error.message,
                code: stripe_error.error.code,
            }),
            Err(_) => Err(StripeError::Api {
                error_type: "unknown".to_string(),
                message: format!("HTTP {status}"),
                code: None,
            }),
        }
    }
}

#[async_trait]
impl CheckoutProvider for StripeClient {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest<'_>,
    ) -> Result<CheckoutSession, StripeError> {
        let credits = request.credits.to_string();
        let params = [
            ("mode", "payment"),
            ("payment_method_types[0]", "card"),
            ("payment_method_types[1]", "us_bank_account"),
            ("line_items[0][price]", request.price_id),
            ("line_items[0][quantity]", "1"),
            ("client_reference_id", request.user_id),
            ("metadata[userId]", request.user_id),
            ("metadata[credits]", credits.as_str()),
            ("success_url", request.success_url),
            ("cancel_url", request.cancel_url),
        ];

        tracing::debug!(
            user_id = %request.user_id,
            credits = request.credits,
            price_id = %request.price_id,
            "Creating Stripe checkout session"
        );

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        Self::handle_response(response).await
    }
}
