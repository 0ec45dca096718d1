//! In-memory storage implementation.
//!
//! Used by tests and for running the service without a database. State lives
//! for the lifetime of the process only.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use pixelmint_core::{CreditAccount, Image, ImageId, SuggestedPrompt, UserId};

use crate::error::{Result, StoreError};
use crate::{sort_newest_first, Store};

#[derive(Default)]
struct Inner {
    accounts: HashMap<UserId, CreditAccount>,
    images: HashMap<ImageId, Image>,
    prompts: Vec<SuggestedPrompt>,
}

/// In-memory [`Store`] backed by a single lock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of credit accounts held.
    pub async fn account_count(&self) -> usize {
        self.inner.read().await.accounts.len()
    }

    /// Number of image records held.
    pub async fn image_count(&self) -> usize {
        self.inner.read().await.images.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_or_create_account(&self, user_id: &UserId) -> Result<CreditAccount> {
        let mut inner = self.inner.write().await;
        let account = inner
            .accounts
            .entry(user_id.clone())
            .or_insert_with(|| {
                tracing::debug!(user_id = %user_id, "Creating credit account");
                CreditAccount::new(user_id.clone())
            });
        Ok(account.clone())
    }

    async fn get_account(&self, user_id: &UserId) -> Result<Option<CreditAccount>> {
        Ok(self.inner.read().await.accounts.get(user_id).cloned())
    }

    async fn increment_credits(&self, user_id: &UserId, amount: i64) -> Result<i64> {
        if amount <= 0 {
            return Err(StoreError::InvalidAmount(amount));
        }

        let mut inner = self.inner.write().await;
        let account = inner
            .accounts
            .get_mut(user_id)
            .ok_or_else(|| StoreError::account_not_found(user_id))?;

        account.credits = account
            .credits
            .checked_add(amount)
            .ok_or(StoreError::InvalidAmount(amount))?;
        account.updated_at = chrono::Utc::now();
        Ok(account.credits)
    }

    async fn decrement_credit(&self, user_id: &UserId) -> Result<i64> {
        let mut inner = self.inner.write().await;
        let account = inner
            .accounts
            .get_mut(user_id)
            .ok_or_else(|| StoreError::account_not_found(user_id))?;

        if !account.can_spend() {
            return Err(StoreError::InsufficientCredits {
                balance: account.credits,
            });
        }

        account.credits -= 1;
        account.updated_at = chrono::Utc::now();
        Ok(account.credits)
    }

    async fn insert_image(&self, image: &Image) -> Result<()> {
        self.inner
            .write()
            .await
            .images
            .insert(image.id, image.clone());
        Ok(())
    }

    async fn get_image(&self, image_id: &ImageId) -> Result<Option<Image>> {
        Ok(self.inner.read().await.images.get(image_id).cloned())
    }

    async fn list_images(&self, limit: usize) -> Result<Vec<Image>> {
        let mut images: Vec<_> = self.inner.read().await.images.values().cloned().collect();
        sort_newest_first(&mut images);
        images.truncate(limit);
        Ok(images)
    }

    async fn list_images_by_author(&self, author_id: &UserId, limit: usize) -> Result<Vec<Image>> {
        let mut images: Vec<_> = self
            .inner
            .read()
            .await
            .images
            .values()
            .filter(|image| &image.author_id == author_id)
            .cloned()
            .collect();
        sort_newest_first(&mut images);
        images.truncate(limit);
        Ok(images)
    }

    async fn delete_image(&self, image_id: &ImageId) -> Result<Image> {
        self.inner
            .write()
            .await
            .images
            .remove(image_id)
            .ok_or_else(|| StoreError::image_not_found(image_id))
    }

    async fn suggested_prompt_count(&self) -> Result<u64> {
        Ok(self.inner.read().await.prompts.len() as u64)
    }

    async fn suggested_prompt_at(&self, index: u64) -> Result<Option<SuggestedPrompt>> {
        let inner = self.inner.read().await;
        Ok(usize::try_from(index)
            .ok()
            .and_then(|i| inner.prompts.get(i))
            .cloned())
    }

    async fn put_suggested_prompts(&self, texts: &[String]) -> Result<usize> {
        let mut inner = self.inner.write().await;
        let mut next_id = inner.prompts.last().map_or(1, |p| p.id + 1);
        for text in texts {
            inner.prompts.push(SuggestedPrompt {
                id: next_id,
                text: text.clone(),
            });
            next_id += 1;
        }
        Ok(texts.len())
    }
}
