//! PostgreSQL storage implementation.
//!
//! Queries are built at runtime with `sqlx::query_as` so the crate compiles
//! without a live database. Schema lives in `migrations/` and is embedded at
//! build time.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;

use pixelmint_core::{
    CreditAccount, Image, ImageId, Prompt, SuggestedPrompt, UserId, INITIAL_CREDITS,
};

use crate::error::{Result, StoreError};
use crate::Store;

/// Maximum pooled connections per process.
const MAX_CONNECTIONS: u32 = 10;

/// How long to wait for a pooled connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// PostgreSQL-backed storage implementation.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct AccountRow {
    user_id: String,
    credits: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for CreditAccount {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self> {
        Ok(Self {
            user_id: row.user_id.parse::<UserId>().map_err(pixelmint_core::CoreError::from)?,
            credits: row.credits,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ImageRow {
    id: String,
    author_id: String,
    prompt: String,
    url: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ImageRow> for Image {
    type Error = StoreError;

    fn try_from(row: ImageRow) -> Result<Self> {
        Ok(Self {
            id: row.id.parse::<ImageId>().map_err(pixelmint_core::CoreError::from)?,
            author_id: row
                .author_id
                .parse::<UserId>()
                .map_err(pixelmint_core::CoreError::from)?,
            prompt: Prompt::parse(row.prompt).map_err(pixelmint_core::CoreError::from)?,
            url: row.url,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct PromptRow {
    id: i64,
    text: String,
}

impl From<PromptRow> for SuggestedPrompt {
    fn from(row: PromptRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
        }
    }
}

const ACCOUNT_COLUMNS: &str = "user_id, credits, created_at, updated_at";
const IMAGE_COLUMNS: &str = "id, author_id, prompt, url, created_at";

impl PgStore {
    /// Connect to the database at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection can be established.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    async fn balance(&self, user_id: &UserId) -> Result<Option<i64>> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT credits FROM credit_accounts WHERE user_id = $1")
                .bind(user_id.as_str())
                .fetch_optional(&self.pool)
                .await?,
        )
    }
}

/// Clamp a feed limit into the range Postgres accepts for `LIMIT`.
fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// SQLSTATE for `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Report a `BIGINT` overflow on the balance the way the other backends do.
fn overflow_as_invalid(err: sqlx::Error, amount: i64) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) => {
            StoreError::InvalidAmount(amount)
        }
        _ => err.into(),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn get_or_create_account(&self, user_id: &UserId) -> Result<CreditAccount> {
        let inserted = sqlx::query(
            "INSERT INTO credit_accounts (user_id, credits) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id.as_str())
        .bind(INITIAL_CREDITS)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted > 0 {
            tracing::debug!(user_id = %user_id, "Created credit account");
        }

        self.get_account(user_id)
            .await?
            .ok_or_else(|| StoreError::account_not_found(user_id))
    }

    async fn get_account(&self, user_id: &UserId) -> Result<Option<CreditAccount>> {
        sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM credit_accounts WHERE user_id = $1"
        ))
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?
        .map(CreditAccount::try_from)
        .transpose()
    }

    async fn increment_credits(&self, user_id: &UserId, amount: i64) -> Result<i64> {
        if amount <= 0 {
            return Err(StoreError::InvalidAmount(amount));
        }

        sqlx::query_scalar::<_, i64>(
            "UPDATE credit_accounts SET credits = credits + $2, updated_at = now() \
             WHERE user_id = $1 RETURNING credits",
        )
        .bind(user_id.as_str())
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| overflow_as_invalid(e, amount))?
        .ok_or_else(|| StoreError::account_not_found(user_id))
    }

    async fn decrement_credit(&self, user_id: &UserId) -> Result<i64> {
        let updated = sqlx::query_scalar::<_, i64>(
            "UPDATE credit_accounts SET credits = credits - 1, updated_at = now() \
             WHERE user_id = $1 AND credits > 0 RETURNING credits",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(balance) = updated {
            return Ok(balance);
        }

        // Nothing matched: either the account is missing or it is empty.
        match self.balance(user_id).await? {
            Some(balance) => Err(StoreError::InsufficientCredits { balance }),
            None => Err(StoreError::account_not_found(user_id)),
        }
    }

    async fn insert_image(&self, image: &Image) -> Result<()> {
        sqlx::query(
            "INSERT INTO images (id, author_id, prompt, url, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(image.id.to_string())
        .bind(image.author_id.as_str())
        .bind(image.prompt.as_str())
        .bind(&image.url)
        .bind(image.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_image(&self, image_id: &ImageId) -> Result<Option<Image>> {
        sqlx::query_as::<_, ImageRow>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM images WHERE id = $1"
        ))
        .bind(image_id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .map(Image::try_from)
        .transpose()
    }

    async fn list_images(&self, limit: usize) -> Result<Vec<Image>> {
        sqlx::query_as::<_, ImageRow>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM images ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Image::try_from)
        .collect()
    }

    async fn list_images_by_author(&self, author_id: &UserId, limit: usize) -> Result<Vec<Image>> {
        sqlx::query_as::<_, ImageRow>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM images WHERE author_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        ))
        .bind(author_id.as_str())
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Image::try_from)
        .collect()
    }

    async fn delete_image(&self, image_id: &ImageId) -> Result<Image> {
        sqlx::query_as::<_, ImageRow>(&format!(
            "DELETE FROM images WHERE id = $1 RETURNING {IMAGE_COLUMNS}"
        ))
        .bind(image_id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .map(Image::try_from)
        .transpose()?
        .ok_or_else(|| StoreError::image_not_found(image_id))
    }

    async fn suggested_prompt_count(&self) -> Result<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM suggested_prompts")
            .fetch_one(&self.pool)
            .await?;

        u64::try_from(count).map_err(|e| StoreError::Database(e.to_string()))
    }

    async fn suggested_prompt_at(&self, index: u64) -> Result<Option<SuggestedPrompt>> {
        let offset = i64::try_from(index).map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(sqlx::query_as::<_, PromptRow>(
            "SELECT id, text FROM suggested_prompts ORDER BY id OFFSET $1 LIMIT 1",
        )
        .bind(offset)
        .fetch_optional(&self.pool)
        .await?
        .map(SuggestedPrompt::from))
    }

    async fn put_suggested_prompts(&self, texts: &[String]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for text in texts {
            sqlx::query("INSERT INTO suggested_prompts (text) VALUES ($1)")
                .bind(text)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(texts.len())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
