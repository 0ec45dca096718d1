//! Common test utilities for pixelmint integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use axum_test::{TestRequest, TestServer};

use pixelmint_core::{Prompt, UserId};
use pixelmint_service::clerk::{Author, DirectoryError, UserDirectory};
use pixelmint_service::generation::{GenerationError, ImageGenerator};
use pixelmint_service::stripe::{CheckoutProvider, CheckoutRequest, CheckoutSession, StripeError};
use pixelmint_service::{create_router, ApiError, AppState, Authenticator, ServiceConfig};
use pixelmint_store::{MemoryStore, Store};

/// Webhook signing secret used by the default harness.
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Public host used for checkout redirects.
pub const HOST: &str = "https://pixelmint.test";

/// Accepts `test:<user id>` tokens.
pub struct StaticAuthenticator;

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<UserId, ApiError> {
        token
            .strip_prefix("test:")
            .and_then(|user| user.parse().ok())
            .ok_or(ApiError::Unauthorized)
    }
}

/// Image generator that counts calls and can be told to fail.
#[derive(Default)]
pub struct FakeGenerator {
    calls: AtomicUsize,
    fail: AtomicBool,
    transport_failure: AtomicBool,
    url_override: Mutex<Option<String>>,
    delay: Mutex<Option<Duration>>,
}

impl FakeGenerator {
    /// Number of generate calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every later call fail with a provider error.
    pub fn fail_with_response(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Make every later call fail without a response.
    pub fn fail_with_transport(&self) {
        self.transport_failure.store(true, Ordering::SeqCst);
    }

    /// Sleep for `delay` at the start of every later call.
    pub fn respond_after(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Return `url` from every later call.
    pub fn respond_with_url(&self, url: impl Into<String>) {
        *self.url_override.lock().unwrap() = Some(url.into());
    }
}

#[async_trait]
impl ImageGenerator for FakeGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<String, GenerationError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.transport_failure.load(Ordering::SeqCst) {
            return Err(GenerationError::Transport("connection refused".into()));
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(GenerationError::Response {
                status: 400,
                message: format!("Your request was rejected: {}", prompt.as_str()),
            });
        }

        if let Some(url) = self.url_override.lock().unwrap().clone() {
            return Ok(url);
        }
        Ok(format!("https://images.test/generated-{n}.png"))
    }
}

/// A checkout request as seen by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCheckout {
    pub user_id: String,
    pub price_id: String,
    pub credits: i64,
    pub success_url: String,
    pub cancel_url: String,
}

/// Checkout provider that records requests.
#[derive(Default)]
pub struct FakeCheckout {
    requests: Mutex<Vec<RecordedCheckout>>,
    fail: AtomicBool,
}

impl FakeCheckout {
    /// Requests received so far.
    pub fn requests(&self) -> Vec<RecordedCheckout> {
        self.requests.lock().unwrap().clone()
    }

    /// Make every later call fail.
    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CheckoutProvider for FakeCheckout {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest<'_>,
    ) -> Result<CheckoutSession, StripeError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StripeError::Api {
                error_type: "invalid_request_error".into(),
                message: "No such price".into(),
                code: Some("resource_missing".into()),
            });
        }

        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedCheckout {
            user_id: request.user_id.to_string(),
            price_id: request.price_id.to_string(),
            credits: request.credits,
            success_url: request.success_url.to_string(),
            cancel_url: request.cancel_url.to_string(),
        });

        let id = format!("cs_test_{}", requests.len());
        Ok(CheckoutSession {
            url: Some(format!("https://checkout.stripe.test/pay/{id}")),
            id,
            payment_status: Some("unpaid".into()),
            client_reference_id: Some(request.user_id.to_string()),
            metadata: serde_json::json!({}),
        })
    }
}

/// Directory that knows every user as `name-<id>`, or always fails.
#[derive(Default)]
pub struct FakeDirectory {
    pub fail: bool,
}

#[async_trait]
impl UserDirectory for FakeDirectory {
    async fn lookup(&self, ids: &[UserId]) -> Result<Vec<Author>, DirectoryError> {
        if self.fail {
            return Err(DirectoryError::Status(503));
        }
        Ok(ids
            .iter()
            .map(|id| Author {
                id: id.to_string(),
                username: Some(format!("name-{id}")),
                profile_image_url: None,
            })
            .collect())
    }
}

/// Configuration used by the default harness.
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listen_addr = "127.0.0.1:0".into();
    config.stripe_webhook_secret = Some(WEBHOOK_SECRET.into());
    config.stripe_prices.ten = Some("price_10".into());
    config.stripe_prices.fifty = Some("price_50".into());
    config.stripe_prices.hundred = Some("price_100".into());
    config.host = Some(HOST.into());
    config.cors_origins = vec!["*".into()];
    config
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Backing store, for direct inspection.
    pub store: Arc<MemoryStore>,
    /// The injected image generator.
    pub generator: Arc<FakeGenerator>,
    /// The injected checkout provider.
    pub checkout: Arc<FakeCheckout>,
}

impl TestHarness {
    /// Harness with every collaborator configured.
    pub fn new() -> Self {
        Self::build(test_config(), |state| state)
    }

    /// Harness with a custom configuration and state adjustments.
    pub fn build(config: ServiceConfig, customize: impl FnOnce(AppState) -> AppState) -> Self {
        let store = Arc::new(MemoryStore::new());
        let generator = Arc::new(FakeGenerator::default());
        let checkout = Arc::new(FakeCheckout::default());

        let state = AppState::new(
            store.clone() as Arc<dyn Store>,
            Arc::new(StaticAuthenticator),
            config,
        )
        .with_generator(generator.clone())
        .with_checkout(checkout.clone());

        let router: Router = create_router(customize(state));
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            generator,
            checkout,
        }
    }

    /// Current balance of `user`, creating the account if needed.
    pub async fn balance(&self, user: &str) -> i64 {
        self.store
            .get_or_create_account(&user_id(user))
            .await
            .expect("balance lookup")
            .credits
    }

    /// Add credits directly to `user`'s account.
    pub async fn grant(&self, user: &str, amount: i64) {
        let id = user_id(user);
        self.store.get_or_create_account(&id).await.unwrap();
        self.store.increment_credits(&id, amount).await.unwrap();
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a test user ID.
pub fn user_id(raw: &str) -> UserId {
    raw.parse().expect("valid user id")
}

/// `Authorization` header for `user`.
pub fn auth(user: &str) -> (HeaderName, HeaderValue) {
    (
        axum::http::header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer test:{user}")).unwrap(),
    )
}

/// Sign requests as a given test user.
pub trait AsUser {
    /// Attach `Authorization: Bearer test:<user>`.
    fn as_user(self, user: &str) -> Self;
}

impl AsUser for TestRequest {
    fn as_user(self, user: &str) -> Self {
        let (name, value) = auth(user);
        self.add_header(name, value)
    }
}
