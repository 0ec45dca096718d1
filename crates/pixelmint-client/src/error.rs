//! Client error types.

/// Errors that can occur when using the pixelmint client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// The account has no credit left.
    #[error("insufficient credits: balance={balance}")]
    InsufficientCredits {
        /// Balance reported by the server.
        balance: i64,
    },

    /// The requested record does not exist.
    #[error("not found: {message}")]
    NotFound {
        /// Server message.
        message: String,
    },

    /// The request was rejected as invalid.
    #[error("validation error: {message}")]
    Validation {
        /// Server message.
        message: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
