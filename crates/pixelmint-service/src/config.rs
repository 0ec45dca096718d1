//! Service configuration.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use pixelmint_core::CreditPackage;

/// Stripe price identifiers, one per credit package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackagePrices {
    /// Price for the 10-credit package.
    #[serde(default)]
    pub ten: Option<String>,
    /// Price for the 50-credit package.
    #[serde(default)]
    pub fifty: Option<String>,
    /// Price for the 100-credit package.
    #[serde(default)]
    pub hundred: Option<String>,
}

impl PackagePrices {
    /// The configured price identifier for `package`, if any.
    #[must_use]
    pub fn for_package(&self, package: CreditPackage) -> Option<&str> {
        match package {
            CreditPackage::Ten => self.ten.as_deref(),
            CreditPackage::Fifty => self.fifty.as_deref(),
            CreditPackage::Hundred => self.hundred.as_deref(),
        }
    }
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// PostgreSQL connection string. Takes precedence over `data_dir`.
    pub database_url: Option<String>,

    /// `RocksDB` data directory (used with the `rocksdb-backend` feature).
    pub data_dir: Option<String>,

    /// JWT issuer; JWKS is fetched from `{issuer}/.well-known/jwks.json`.
    pub auth_issuer: String,

    /// Expected JWT audience. Not checked when unset.
    pub auth_audience: Option<String>,

    /// Clerk backend secret, enables author lookups on the feed.
    pub clerk_secret_key: Option<String>,

    /// Stripe secret API key.
    pub stripe_secret_key: Option<String>,

    /// Stripe webhook signing secret.
    pub stripe_webhook_secret: Option<String>,

    /// Stripe price IDs per package.
    pub stripe_prices: PackagePrices,

    /// OpenAI API key for image generation.
    pub openai_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible images API.
    pub openai_base_url: String,

    /// S3 bucket for re-hosted images.
    pub asset_bucket: Option<String>,

    /// Region of the asset bucket.
    pub asset_region: Option<String>,

    /// Public URL prefix under which stored assets are served.
    pub asset_public_base_url: Option<String>,

    /// Local directory for re-hosted images (used when no bucket is set).
    pub asset_local_dir: Option<String>,

    /// Public host used to build checkout redirect URLs.
    pub host: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds. Image generation is bounded by
    /// [`ServiceConfig::generation_timeout`], which stays below it.
    pub request_timeout_seconds: u64,

    /// Give the credit back when generation or asset storage fails.
    pub refund_failed_generations: bool,

    /// JSON array of prompts used to seed an empty suggested-prompt set.
    pub suggested_prompts_file: Option<String>,
}

/// Stripe secrets file structure.
#[derive(Debug, Deserialize)]
struct StripeSecrets {
    secret_key: String,
    #[serde(default)]
    webhook_secret: Option<String>,
    #[serde(default)]
    prices: Option<PackagePrices>,
}

/// OpenAI secrets file structure.
#[derive(Debug, Deserialize)]
struct OpenAiSecrets {
    api_key: String,
    #[serde(default)]
    base_url: Option<String>,
}

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_AUTH_ISSUER: &str = "http://localhost:3000";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 150;

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::from_source(|key| std::env::var(key).ok());

        if let Some(secrets) = find_secrets::<StripeSecrets>("stripe.json") {
            config.stripe_secret_key = Some(secrets.secret_key);
            config.stripe_webhook_secret = secrets.webhook_secret.or(config.stripe_webhook_secret);
            if let Some(prices) = secrets.prices {
                config.stripe_prices = prices;
            }
        }

        if let Some(secrets) = find_secrets::<OpenAiSecrets>("openai.json") {
            config.openai_api_key = Some(secrets.api_key);
            if let Some(base_url) = secrets.base_url {
                config.openai_base_url = base_url;
            }
        }

        config
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        Self {
            listen_addr: var("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.into()),
            database_url: var("DATABASE_URL"),
            data_dir: var("DATA_DIR"),
            auth_issuer: var("AUTH_ISSUER")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_AUTH_ISSUER.into()),
            auth_audience: var("AUTH_AUDIENCE"),
            clerk_secret_key: var("CLERK_SECRET_KEY"),
            stripe_secret_key: var("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: var("STRIPE_WEBHOOK_SECRET"),
            stripe_prices: PackagePrices {
                ten: var("STRIPE_10CREDIT_PRICE"),
                fifty: var("STRIPE_50CREDIT_PRICE"),
                hundred: var("STRIPE_100CREDIT_PRICE"),
            },
            openai_api_key: var("OPENAI_API_KEY"),
            openai_base_url: var("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.into()),
            asset_bucket: var("ASSET_BUCKET"),
            asset_region: var("ASSET_REGION"),
            asset_public_base_url: var("ASSET_PUBLIC_BASE_URL"),
            asset_local_dir: var("ASSET_LOCAL_DIR"),
            host: var("HOST").map(|s| s.trim_end_matches('/').to_string()),
            cors_origins: var("CORS_ORIGINS")
                .unwrap_or_else(|| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            max_body_bytes: var("MAX_BODY_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),
            request_timeout_seconds: var("REQUEST_TIMEOUT_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECONDS),
            refund_failed_generations: var("REFUND_FAILED_GENERATIONS")
                .is_some_and(|s| parse_bool(&s)),
            suggested_prompts_file: var("SUGGESTED_PROMPTS_FILE"),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Look for `name` in the usual secrets directories.
fn find_secrets<T: serde::de::DeserializeOwned>(name: &str) -> Option<T> {
    let dirs = [".secrets", "../.secrets", "../../.secrets"];

    for dir in dirs {
        let path = Path::new(dir).join(name);
        if !path.exists() {
            continue;
        }
        match load_secrets_file::<T>(&path) {
            Ok(secrets) => {
                tracing::info!(path = %path.display(), "Loaded secrets from file");
                return Some(secrets);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable secrets file");
            }
        }
    }

    tracing::debug!(file = %name, "Secrets file not found, using environment variables");
    None
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, std::io::Error> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl ServiceConfig {
    /// Deadline for one generate-and-store run: three quarters of the
    /// request timeout, so the caller always gets the workflow's own answer.
    #[must_use]
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds).mul_f64(0.75)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_source(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> ServiceConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServiceConfig::from_source(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.openai_base_url, "https://api.openai.com");
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
        assert!(config.database_url.is_none());
        assert!(!config.refund_failed_generations);
    }

    #[test]
    fn reads_package_prices() {
        let config = config_from(&[
            ("STRIPE_10CREDIT_PRICE", "price_10"),
            ("STRIPE_100CREDIT_PRICE", "price_100"),
        ]);
        let prices = &config.stripe_prices;
        assert_eq!(prices.for_package(CreditPackage::Ten), Some("price_10"));
        assert_eq!(prices.for_package(CreditPackage::Fifty), None);
        assert_eq!(prices.for_package(CreditPackage::Hundred), Some("price_100"));
    }

    #[test]
    fn blank_values_are_unset() {
        let config = config_from(&[("STRIPE_SECRET_KEY", "  "), ("HOST", "")]);
        assert!(config.stripe_secret_key.is_none());
        assert!(config.host.is_none());
    }

    #[test]
    fn normalizes_urls_and_lists() {
        let config = config_from(&[
            ("HOST", "https://pixelmint.app/"),
            ("AUTH_ISSUER", "https://clerk.pixelmint.app/"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
        ]);
        assert_eq!(config.host.as_deref(), Some("https://pixelmint.app"));
        assert_eq!(config.auth_issuer, "https://clerk.pixelmint.app");
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn parses_numbers_and_flags() {
        let config = config_from(&[
            ("MAX_BODY_BYTES", "2048"),
            ("REQUEST_TIMEOUT_SECONDS", "bogus"),
            ("REFUND_FAILED_GENERATIONS", "TRUE"),
        ]);
        assert_eq!(config.max_body_bytes, 2048);
        assert_eq!(config.request_timeout_seconds, 150);
        assert!(config.refund_failed_generations);
    }

    #[test]
    fn generation_deadline_is_inside_request_timeout() {
        let config = config_from(&[("REQUEST_TIMEOUT_SECONDS", "4")]);
        assert_eq!(config.generation_timeout(), Duration::from_secs(3));
        assert!(ServiceConfig::default().generation_timeout() < Duration::from_secs(150));
    }
}
