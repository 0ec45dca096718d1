//! Credit account types for pixelmint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Credits granted to an account the first time its balance is read.
pub const INITIAL_CREDITS: i64 = 1;

/// A credit account for a user.
///
/// One row exists per user. Accounts are created lazily on the first balance
/// query and only ever mutated by purchases (increment) and generations
/// (decrement).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditAccount {
    /// The user ID (from the authentication provider).
    pub user_id: UserId,

    /// Current credit balance. Never driven below zero by the ledger.
    pub credits: i64,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl CreditAccount {
    /// Create a new account holding [`INITIAL_CREDITS`].
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            credits: INITIAL_CREDITS,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the account can pay for one more generation.
    #[must_use]
    pub fn can_spend(&self) -> bool {
        self.credits > 0
    }
}
