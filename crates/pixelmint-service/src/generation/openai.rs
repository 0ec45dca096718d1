//! OpenAI-compatible images API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use pixelmint_core::Prompt;

use super::{GenerationError, ImageGenerator};

/// Generation can take a while; keep this above the provider's own limit.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Size requested for every image.
pub const IMAGE_SIZE: &str = "1024x1024";

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    prompt: &'a str,
    n: u8,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Client for `POST /v1/images/generations`.
#[derive(Debug, Clone)]
pub struct OpenAiImageClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiImageClient {
    /// Create a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String, GenerationError> {
        let body = GenerationRequest {
            prompt: prompt.as_str(),
            n: 1,
            size: IMAGE_SIZE,
        };

        let response = self
            .client
            .post(format!("{}/v1/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));

            tracing::warn!(status = %status, message = %message, "Image generation rejected");
            return Err(GenerationError::Response {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerationResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Transport(format!("unreadable response: {e}")))?;

        parsed
            .data
            .into_iter()
            .find_map(|image| image.url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| GenerationError::Response {
                status: status.as_u16(),
                message: "response contained no image".into(),
            })
    }
}
