//! `RocksDB` storage implementation.
//!
//! `RocksDB` calls are synchronous and short, so the async trait methods call
//! straight into them. Read-modify-write sequences on the ledger and prompt
//! set are serialized by `write_lock`; readers never take it.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use pixelmint_core::{CreditAccount, Image, ImageId, SuggestedPrompt, UserId};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{sort_newest_first, Store};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    write_lock: Mutex<()>,
}

fn db_err(err: impl ToString) -> StoreError {
    StoreError::Database(err.to_string())
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(db_err)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Database("write lock poisoned".into()))
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn read_account(&self, user_id: &UserId) -> Result<Option<CreditAccount>> {
        let cf = self.cf(cf::ACCOUNTS)?;
        self.db
            .get_cf(&cf, keys::account_key(user_id))
            .map_err(db_err)?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn write_account(&self, account: &CreditAccount) -> Result<()> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let value = Self::serialize(account)?;
        self.db
            .put_cf(&cf, keys::account_key(&account.user_id), value)
            .map_err(db_err)
    }

    fn read_image(&self, image_id: &ImageId) -> Result<Option<Image>> {
        let cf = self.cf(cf::IMAGES)?;
        self.db
            .get_cf(&cf, keys::image_key(image_id))
            .map_err(db_err)?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn prompts(&self) -> Result<Vec<SuggestedPrompt>> {
        let cf = self.cf(cf::SUGGESTED_PROMPTS)?;
        self.db
            .iterator_cf(&cf, IteratorMode::Start)
            .map(|item| {
                let (_, value) = item.map_err(db_err)?;
                Self::deserialize(&value)
            })
            .collect()
    }
}

#[async_trait]
impl Store for RocksStore {
    // =========================================================================
    // Credit Ledger
    // =========================================================================

    async fn get_or_create_account(&self, user_id: &UserId) -> Result<CreditAccount> {
        if let Some(account) = self.read_account(user_id)? {
            return Ok(account);
        }

        let _guard = self.lock()?;
        if let Some(account) = self.read_account(user_id)? {
            return Ok(account);
        }

        let account = CreditAccount::new(user_id.clone());
        self.write_account(&account)?;
        tracing::debug!(user_id = %user_id, "Created credit account");
        Ok(account)
    }

    async fn get_account(&self, user_id: &UserId) -> Result<Option<CreditAccount>> {
        self.read_account(user_id)
    }

    async fn increment_credits(&self, user_id: &UserId, amount: i64) -> Result<i64> {
        if amount <= 0 {
            return Err(StoreError::InvalidAmount(amount));
        }

        let _guard = self.lock()?;
        let mut account = self
            .read_account(user_id)?
            .ok_or_else(|| StoreError::account_not_found(user_id))?;

        account.credits = account
            .credits
            .checked_add(amount)
            .ok_or(StoreError::InvalidAmount(amount))?;
        account.updated_at = chrono::Utc::now();
        self.write_account(&account)?;

        Ok(account.credits)
    }

    async fn decrement_credit(&self, user_id: &UserId) -> Result<i64> {
        let _guard = self.lock()?;
        let mut account = self
            .read_account(user_id)?
            .ok_or_else(|| StoreError::account_not_found(user_id))?;

        if !account.can_spend() {
            return Err(StoreError::InsufficientCredits {
                balance: account.credits,
            });
        }

        account.credits -= 1;
        account.updated_at = chrono::Utc::now();
        self.write_account(&account)?;

        Ok(account.credits)
    }

    // =========================================================================
    // Images
    // =========================================================================

    async fn insert_image(&self, image: &Image) -> Result<()> {
        let cf_images = self.cf(cf::IMAGES)?;
        let cf_by_author = self.cf(cf::IMAGES_BY_AUTHOR)?;

        let value = Self::serialize(image)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_images, keys::image_key(&image.id), &value);
        batch.put_cf(
            &cf_by_author,
            keys::author_image_key(&image.author_id, &image.id),
            [],
        );

        self.db.write(batch).map_err(db_err)
    }

    async fn get_image(&self, image_id: &ImageId) -> Result<Option<Image>> {
        self.read_image(image_id)
    }

    async fn list_images(&self, limit: usize) -> Result<Vec<Image>> {
        let cf = self.cf(cf::IMAGES)?;

        // ULID keys are creation-ordered, so walking backwards yields newest first.
        let mut images = self
            .db
            .iterator_cf(&cf, IteratorMode::End)
            .take(limit)
            .map(|item| {
                let (_, value) = item.map_err(db_err)?;
                Self::deserialize::<Image>(&value)
            })
            .collect::<Result<Vec<_>>>()?;

        sort_newest_first(&mut images);
        Ok(images)
    }

    async fn list_images_by_author(&self, author_id: &UserId, limit: usize) -> Result<Vec<Image>> {
        let cf_by_author = self.cf(cf::IMAGES_BY_AUTHOR)?;
        let prefix = keys::author_prefix(author_id);

        let mut ids = Vec::new();
        for item in self
            .db
            .iterator_cf(&cf_by_author, IteratorMode::From(&prefix, Direction::Forward))
        {
            let (key, _) = item.map_err(db_err)?;
            if !key.starts_with(&prefix) {
                break;
            }
            if let Some(id) = keys::image_id_from_author_key(&key) {
                ids.push(id);
            }
        }

        let mut images = Vec::with_capacity(ids.len().min(limit));
        for id in ids.iter().rev() {
            if images.len() >= limit {
                break;
            }
            if let Some(image) = self.read_image(id)? {
                images.push(image);
            }
        }

        sort_newest_first(&mut images);
        Ok(images)
    }

    async fn delete_image(&self, image_id: &ImageId) -> Result<Image> {
        let _guard = self.lock()?;
        let image = self
            .read_image(image_id)?
            .ok_or_else(|| StoreError::image_not_found(image_id))?;

        let cf_images = self.cf(cf::IMAGES)?;
        let cf_by_author = self.cf(cf::IMAGES_BY_AUTHOR)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_images, keys::image_key(image_id));
        batch.delete_cf(
            &cf_by_author,
            keys::author_image_key(&image.author_id, image_id),
        );
        self.db.write(batch).map_err(db_err)?;

        Ok(image)
    }

    // =========================================================================
    // Suggested Prompts
    // =========================================================================

    async fn suggested_prompt_count(&self) -> Result<u64> {
        let cf = self.cf(cf::SUGGESTED_PROMPTS)?;
        let mut count = 0u64;
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            item.map_err(db_err)?;
            count += 1;
        }
        Ok(count)
    }

    async fn suggested_prompt_at(&self, index: u64) -> Result<Option<SuggestedPrompt>> {
        let Ok(index) = usize::try_from(index) else {
            return Ok(None);
        };
        Ok(self.prompts()?.into_iter().nth(index))
    }

    async fn put_suggested_prompts(&self, texts: &[String]) -> Result<usize> {
        let _guard = self.lock()?;
        let cf = self.cf(cf::SUGGESTED_PROMPTS)?;

        let mut next_id = match self.db.iterator_cf(&cf, IteratorMode::End).next() {
            Some(item) => {
                let (key, _) = item.map_err(db_err)?;
                keys::prompt_id(&key).map_or(1, |id| id + 1)
            }
            None => 1,
        };

        let mut batch = WriteBatch::default();
        for text in texts {
            let prompt = SuggestedPrompt {
                id: next_id,
                text: text.clone(),
            };
            batch.put_cf(&cf, keys::prompt_key(next_id), Self::serialize(&prompt)?);
            next_id += 1;
        }
        self.db.write(batch).map_err(db_err)?;

        Ok(texts.len())
    }
}
