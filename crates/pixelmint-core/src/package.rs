//! Purchasable credit packages.

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A credit package offered at checkout.
///
/// Only these sizes can be bought; each maps to a fixed processor price ID
/// in configuration and a fixed display price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum CreditPackage {
    /// 10 credits.
    Ten,
    /// 50 credits.
    Fifty,
    /// 100 credits.
    Hundred,
}

impl CreditPackage {
    /// Every package, smallest first.
    pub const ALL: [Self; 3] = [Self::Ten, Self::Fifty, Self::Hundred];

    /// Number of credits granted when the package is paid.
    #[must_use]
    pub const fn credits(self) -> i64 {
        match self {
            Self::Ten => 10,
            Self::Fifty => 50,
            Self::Hundred => 100,
        }
    }

    /// Display price in cents. The charged amount comes from the price ID.
    #[must_use]
    pub const fn price_cents(self) -> i64 {
        match self {
            Self::Ten => 500,
            Self::Fifty => 2000,
            Self::Hundred => 3500,
        }
    }
}

impl TryFrom<i64> for CreditPackage {
    type Error = CoreError;

    fn try_from(credits: i64) -> Result<Self, Self::Error> {
        match credits {
            10 => Ok(Self::Ten),
            50 => Ok(Self::Fifty),
            100 => Ok(Self::Hundred),
            other => Err(CoreError::UnsupportedPackage(other)),
        }
    }
}

impl From<CreditPackage> for i64 {
    fn from(package: CreditPackage) -> Self {
        package.credits()
    }
}
