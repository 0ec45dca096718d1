//! Application state.

use std::sync::Arc;

use pixelmint_store::Store;

use crate::assets::AssetStore;
use crate::auth::Authenticator;
use crate::clerk::UserDirectory;
use crate::config::ServiceConfig;
use crate::generation::ImageGenerator;
use crate::stripe::CheckoutProvider;

/// Application state shared across handlers.
///
/// Every external collaborator is constructed by the caller and passed in;
/// optional ones stay `None` when their secrets are not configured.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Bearer token validation.
    pub auth: Arc<dyn Authenticator>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Payment processor for checkout sessions.
    pub checkout: Option<Arc<dyn CheckoutProvider>>,

    /// Text-to-image provider.
    pub generator: Option<Arc<dyn ImageGenerator>>,

    /// Where generated images are re-hosted.
    pub assets: Option<Arc<dyn AssetStore>>,

    /// Author profile lookups for the feed.
    pub directory: Option<Arc<dyn UserDirectory>>,

    /// Plain HTTP client for asset downloads.
    pub http: reqwest::Client,
}

impl AppState {
    /// Create state with only the required collaborators.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, auth: Arc<dyn Authenticator>, config: ServiceConfig) -> Self {
        Self {
            store,
            auth,
            config,
            checkout: None,
            generator: None,
            assets: None,
            directory: None,
            http: reqwest::Client::new(),
        }
    }

    /// Attach a checkout provider.
    #[must_use]
    pub fn with_checkout(mut self, checkout: Arc<dyn CheckoutProvider>) -> Self {
        self.checkout = Some(checkout);
        self
    }

    /// Attach an image generator.
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn ImageGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Attach an asset store.
    #[must_use]
    pub fn with_assets(mut self, assets: Arc<dyn AssetStore>) -> Self {
        self.assets = Some(assets);
        self
    }

    /// Attach a user directory.
    #[must_use]
    pub fn with_directory(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Replace the HTTP client used for downloads.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }
}
