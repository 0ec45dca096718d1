//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use pixelmint_store::StoreError;

use crate::assets::AssetError;
use crate::generation::GenerationError;
use crate::stripe::StripeError;

/// Which side of an upstream call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamKind {
    /// The provider answered with an error body.
    Response,
    /// No usable response arrived (connect, timeout, decode).
    Transport,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad input shape or length.
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Valid credentials but not allowed to touch the resource.
    #[error("forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// A lookup over an empty reference set.
    #[error("{0}")]
    EmptyDataset(String),

    /// The caller has no credit left.
    #[error("insufficient credits: balance={balance}")]
    InsufficientCredits {
        /// Balance at the time of the check.
        balance: i64,
    },

    /// A third-party API failed.
    #[error("{message}")]
    Upstream {
        /// Whether an error response was received.
        kind: UpstreamKind,
        /// Provider message, safe to show to the caller.
        message: String,
    },

    /// Persisting a generated asset failed.
    #[error("{0}")]
    Storage(String),

    /// A required secret or setting is missing.
    #[error("{0}")]
    Configuration(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) | Self::EmptyDataset(_) => StatusCode::NOT_FOUND,
            Self::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
            Self::Upstream { .. } | Self::Storage(_) => StatusCode::BAD_GATEWAY,
            Self::Configuration(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::EmptyDataset(_) => "empty_dataset",
            Self::InsufficientCredits { .. } => "insufficient_credits",
            Self::Upstream { .. } => "upstream_error",
            Self::Storage(_) => "storage_error",
            Self::Configuration(_) => "configuration_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, details) = match &self {
            Self::InsufficientCredits { balance } => (
                "Not enough credits".to_string(),
                Some(serde_json::json!({ "balance": balance })),
            ),
            Self::Upstream { kind, .. } => {
                (self.to_string(), Some(serde_json::json!({ "kind": kind })))
            }
            Self::Configuration(msg) => {
                tracing::error!(error = %msg, "Service misconfigured");
                (msg.clone(), None)
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                ("An internal error occurred".to_string(), None)
            }
            _ => (self.to_string(), None),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound(format!("{entity} not found: {id}")),
            StoreError::InsufficientCredits { balance } => Self::InsufficientCredits { balance },
            StoreError::InvalidAmount(amount) => {
                Self::Validation(format!("invalid credit amount: {amount}"))
            }
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        let kind = if err.is_transport() {
            UpstreamKind::Transport
        } else {
            UpstreamKind::Response
        };
        Self::Upstream {
            kind,
            message: err.to_string(),
        }
    }
}

impl From<AssetError> for ApiError {
    fn from(err: AssetError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<StripeError> for ApiError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::Http(e) => Self::Upstream {
                kind: UpstreamKind::Transport,
                message: format!("payment processor unreachable: {e}"),
            },
            other => Self::Upstream {
                kind: UpstreamKind::Response,
                message: other.to_string(),
            },
        }
    }
}
