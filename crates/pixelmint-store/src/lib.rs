//! Storage layer for pixelmint.
//!
//! This crate persists the credit ledger, generated image records, and the
//! static suggested-prompt set behind a single [`Store`] trait.
//!
//! # Backends
//!
//! - [`PgStore`]: PostgreSQL via `sqlx`, with embedded migrations. Production default.
//! - `RocksStore`: `RocksDB` with column families (feature `rocksdb-backend`).
//! - [`MemoryStore`]: process-local maps, for tests and local development.
//!
//! # Example
//!
//! ```no_run
//! use pixelmint_core::UserId;
//! use pixelmint_store::{MemoryStore, Store};
//!
//! # async fn example() -> pixelmint_store::Result<()> {
//! let store = MemoryStore::new();
//! let user_id: UserId = "user_123".parse().unwrap();
//!
//! // First read creates the account with one credit.
//! let account = store.get_or_create_account(&user_id).await?;
//! assert_eq!(account.credits, 1);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
pub mod postgres;

#[cfg(feature = "rocksdb-backend")]
pub mod keys;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
#[cfg(feature = "rocksdb-backend")]
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PgStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use async_trait::async_trait;
use pixelmint_core::{CreditAccount, Image, ImageId, SuggestedPrompt, UserId};

/// The storage trait defining all database operations.
///
/// Every method is a single short request against the backend; none of them
/// retries. Ledger mutations are atomic per call.
#[async_trait]
pub trait Store: Send + Sync {
    // =========================================================================
    // Credit Ledger
    // =========================================================================

    /// Return the user's account, creating it with
    /// [`pixelmint_core::INITIAL_CREDITS`] when it does not exist yet.
    ///
    /// Concurrent first calls for the same user create exactly one account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_or_create_account(&self, user_id: &UserId) -> Result<CreditAccount>;

    /// Get an account without creating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_account(&self, user_id: &UserId) -> Result<Option<CreditAccount>>;

    /// Add `amount` credits and return the new balance.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::InvalidAmount` if `amount` is not positive.
    async fn increment_credits(&self, user_id: &UserId, amount: i64) -> Result<i64>;

    /// Spend one credit and return the new balance.
    ///
    /// The balance check and the update happen atomically, so two concurrent
    /// calls can never drive the balance below zero.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::InsufficientCredits` if the balance is zero or less.
    ///   Nothing is written in that case.
    async fn decrement_credit(&self, user_id: &UserId) -> Result<i64>;

    // =========================================================================
    // Images
    // =========================================================================

    /// Insert a new image record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn insert_image(&self, image: &Image) -> Result<()>;

    /// Get an image by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_image(&self, image_id: &ImageId) -> Result<Option<Image>>;

    /// List the most recent images across all users, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_images(&self, limit: usize) -> Result<Vec<Image>>;

    /// List the most recent images of one author, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_images_by_author(&self, author_id: &UserId, limit: usize) -> Result<Vec<Image>>;

    /// The author's most recent image, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn latest_image_by_author(&self, author_id: &UserId) -> Result<Option<Image>> {
        Ok(self
            .list_images_by_author(author_id, 1)
            .await?
            .into_iter()
            .next())
    }

    /// Delete an image and return the removed record.
    ///
    /// No ownership check happens here; callers decide who may delete.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the image doesn't exist.
    async fn delete_image(&self, image_id: &ImageId) -> Result<Image>;

    // =========================================================================
    // Suggested Prompts
    // =========================================================================

    /// Number of suggested prompts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn suggested_prompt_count(&self) -> Result<u64>;

    /// The suggested prompt at `index` in ID order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn suggested_prompt_at(&self, index: u64) -> Result<Option<SuggestedPrompt>>;

    /// Append suggested prompts and return how many were written.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn put_suggested_prompts(&self, texts: &[String]) -> Result<usize>;

    // =========================================================================
    // Health
    // =========================================================================

    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot serve requests.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Sort images newest first, breaking timestamp ties by ID.
pub(crate) fn sort_newest_first(images: &mut [Image]) {
    images.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
