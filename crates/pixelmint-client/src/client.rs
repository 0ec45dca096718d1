//! Pixelmint HTTP client implementation.

use reqwest::{Client, RequestBuilder};
use std::time::Duration;

use pixelmint_core::{CreditPackage, Image, ImageId, SuggestedPrompt};

use crate::error::ClientError;
use crate::types::{
    ApiErrorResponse, CheckoutResponse, CreateImageRequest, CreditsResponse, DeleteResponse,
    FeedImage,
};

/// Pixelmint API client.
///
/// Public endpoints work without a token; everything else needs a bearer
/// token from the auth provider, set with [`PixelmintClient::with_token`].
#[derive(Debug, Clone)]
pub struct PixelmintClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl PixelmintClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the pixelmint service (e.g., `"http://localhost:8080"`)
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a new client with custom options.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Authenticate subsequent requests with `token`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Current balance. The first call for a user opens the account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn credits(&self) -> Result<i64, ClientError> {
        let response: CreditsResponse = self.send(self.get("/v1/credits")).await?;
        Ok(response.credits)
    }

    /// Spend one credit and return the new balance.
    ///
    /// # Errors
    ///
    /// `ClientError::InsufficientCredits` at zero balance.
    pub async fn decrement_credit(&self) -> Result<i64, ClientError> {
        let response: CreditsResponse = self.send(self.post("/v1/credits/decrement")).await?;
        Ok(response.credits)
    }

    /// Start a checkout for `package`; redirect the user to the returned URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn create_checkout(
        &self,
        package: CreditPackage,
    ) -> Result<CheckoutResponse, ClientError> {
        let path = format!("/v1/checkout/{}", package.credits());
        self.send(self.post(&path)).await
    }

    /// Global feed, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_images(&self, limit: Option<usize>) -> Result<Vec<FeedImage>, ClientError> {
        self.send(with_limit(self.get("/v1/images"), limit)).await
    }

    /// The caller's images, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_my_images(&self, limit: Option<usize>) -> Result<Vec<Image>, ClientError> {
        self.send(with_limit(self.get("/v1/images/mine"), limit))
            .await
    }

    /// The caller's most recent image.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn latest_image(&self) -> Result<Option<Image>, ClientError> {
        self.send(self.get("/v1/images/latest")).await
    }

    /// Generate an image from `prompt`, spending one credit.
    ///
    /// # Errors
    ///
    /// - `ClientError::Validation` for an empty or oversized prompt.
    /// - `ClientError::InsufficientCredits` at zero balance.
    pub async fn create_image(&self, prompt: &str) -> Result<Image, ClientError> {
        self.send(self.post("/v1/images").json(&CreateImageRequest { prompt }))
            .await
    }

    /// Delete one of the caller's images.
    ///
    /// # Errors
    ///
    /// `ClientError::NotFound` when the image does not exist.
    pub async fn delete_image(&self, id: &ImageId) -> Result<(), ClientError> {
        let path = format!("/v1/images/{id}");
        let request = self.authorize(self.client.delete(self.url(&path)));
        let _: DeleteResponse = self.send(request).await?;
        Ok(())
    }

    /// A random suggested prompt.
    ///
    /// # Errors
    ///
    /// `ClientError::NotFound` when no suggestions are loaded.
    pub async fn random_prompt(&self) -> Result<SuggestedPrompt, ClientError> {
        self.send(self.get("/v1/prompts/random")).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.get(self.url(path)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.post(self.url(path)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await?;
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => {
                let code = api_error.error.code.as_str();
                let message = api_error.error.message;
                tracing::debug!(status = %status, code = %code, "pixelmint API error");

                match code {
                    "insufficient_credits" => {
                        let balance = api_error
                            .error
                            .details
                            .as_ref()
                            .and_then(|d| d.get("balance"))
                            .and_then(serde_json::Value::as_i64)
                            .unwrap_or(0);

                        Err(ClientError::InsufficientCredits { balance })
                    }
                    "not_found" | "empty_dataset" => Err(ClientError::NotFound { message }),
                    "validation_error" => Err(ClientError::Validation { message }),
                    _ => Err(ClientError::Api {
                        code: code.to_string(),
                        message,
                        status: status.as_u16(),
                    }),
                }
            }
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

fn with_limit(request: RequestBuilder, limit: Option<usize>) -> RequestBuilder {
    match limit {
        Some(limit) => request.query(&[("limit", limit)]),
        None => request,
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30). Image generation can take a
    /// while, so raise this for [`PixelmintClient::create_image`].
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}
