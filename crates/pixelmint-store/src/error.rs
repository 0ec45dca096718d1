//! Error types for pixelmint storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record that was looked up.
        entity: &'static str,
        /// Key that was looked up.
        id: String,
    },

    /// The account has no credit left to spend.
    #[error("insufficient credits: balance={balance}")]
    InsufficientCredits {
        /// Balance at the time of the check.
        balance: i64,
    },

    /// Ledger amounts must be positive.
    #[error("invalid credit amount: {0}")]
    InvalidAmount(i64),
}

impl StoreError {
    /// Shorthand for a missing credit account.
    pub(crate) fn account_not_found(user_id: impl ToString) -> Self {
        Self::NotFound {
            entity: "credit account",
            id: user_id.to_string(),
        }
    }

    /// Shorthand for a missing image.
    pub(crate) fn image_not_found(image_id: impl ToString) -> Self {
        Self::NotFound {
            entity: "image",
            id: image_id.to_string(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Database(format!("migration failed: {err}"))
    }
}

impl From<pixelmint_core::CoreError> for StoreError {
    fn from(err: pixelmint_core::CoreError) -> Self {
        Self::Serialization(err.to_string())
    }
}
