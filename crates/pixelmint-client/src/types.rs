//! Request and response types for the pixelmint client.

use serde::{Deserialize, Serialize};

use pixelmint_core::Image;

/// Credit balance response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CreditsResponse {
    /// Current balance.
    pub credits: i64,
}

/// Checkout session created for a credit package.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutResponse {
    /// Hosted payment page.
    pub url: String,
    /// Stripe session ID.
    pub session_id: String,
}

/// Image generation request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateImageRequest<'a> {
    /// Prompt text.
    pub prompt: &'a str,
}

/// Public profile attached to feed entries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Author {
    /// User ID.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub username: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

/// One entry of the global feed.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedImage {
    /// The image record.
    #[serde(flatten)]
    pub image: Image,
    /// Author profile, when the server resolved it.
    #[serde(default)]
    pub author: Option<Author>,
}

/// Deletion acknowledgement.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DeleteResponse {
    /// Whether the image was deleted.
    pub deleted: bool,
}

/// API error response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorDetail,
}

/// API error details.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    /// Error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Additional details.
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}
