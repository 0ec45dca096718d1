//! Text-to-image generation.

mod openai;

use async_trait::async_trait;

use pixelmint_core::Prompt;

pub use openai::OpenAiImageClient;

/// Errors from an image generation call.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The provider answered with an error.
    #[error("image provider returned {status}: {message}")]
    Response {
        /// HTTP status returned by the provider.
        status: u16,
        /// Provider-supplied message.
        message: String,
    },

    /// No usable response arrived.
    #[error("image provider unreachable: {0}")]
    Transport(String),
}

impl GenerationError {
    /// Whether the failure happened before any response was received.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Produces one square image for a prompt.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate an image and return the provider's URL for it.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` if the provider fails or is unreachable.
    async fn generate(&self, prompt: &Prompt) -> Result<String, GenerationError>;
}
