//! Error types for pixelmint.

use crate::ids::IdError;
use crate::image::PromptError;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while building domain values.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    /// Invalid prompt text.
    #[error("invalid prompt: {0}")]
    InvalidPrompt(#[from] PromptError),

    /// Credit package size outside the offered set.
    #[error("unsupported credit package: {0}")]
    UnsupportedPackage(i64),
}
