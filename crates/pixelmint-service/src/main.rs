//! Pixelmint Service - HTTP API for credits and image generation
//!
//! This is the main entry point for the pixelmint service.

use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pixelmint_service::assets::{AssetStore, LocalAssetStore, S3AssetStore};
use pixelmint_service::clerk::ClerkDirectory;
use pixelmint_service::generation::OpenAiImageClient;
use pixelmint_service::seed::seed_suggested_prompts;
use pixelmint_service::{create_router, AppState, JwksAuthenticator, ServiceConfig, StripeClient};
use pixelmint_store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pixelmint=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Pixelmint Service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        auth_issuer = %config.auth_issuer,
        postgres_configured = %config.database_url.is_some(),
        stripe_configured = %config.stripe_secret_key.is_some(),
        webhook_secret_configured = %config.stripe_webhook_secret.is_some(),
        openai_configured = %config.openai_api_key.is_some(),
        asset_bucket = ?config.asset_bucket,
        clerk_configured = %config.clerk_secret_key.is_some(),
        refund_failed_generations = %config.refund_failed_generations,
        "Service configuration loaded"
    );

    let store = open_store(&config).await?;

    seed_suggested_prompts(
        store.as_ref(),
        config.suggested_prompts_file.as_deref().map(Path::new),
    )
    .await?;

    let auth = JwksAuthenticator::new(config.auth_issuer.clone(), config.auth_audience.clone())?;

    let mut state = AppState::new(store, Arc::new(auth), config.clone());

    if let Some(key) = &config.stripe_secret_key {
        state = state.with_checkout(Arc::new(StripeClient::new(key.clone())?));
    } else {
        tracing::warn!("STRIPE_SECRET_KEY not set - checkout disabled");
    }

    if let Some(key) = &config.openai_api_key {
        let generator = OpenAiImageClient::new(key.clone(), &config.openai_base_url)?;
        state = state.with_generator(Arc::new(generator));
    } else {
        tracing::warn!("OPENAI_API_KEY not set - image generation disabled");
    }

    if let Some(assets) = open_asset_store(&config).await? {
        state = state.with_assets(assets);
    } else {
        tracing::info!("No asset store configured - serving provider image URLs");
    }

    if let Some(key) = &config.clerk_secret_key {
        state = state.with_directory(Arc::new(ClerkDirectory::new(key.clone())?));
    }

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Pick the storage backend: Postgres, then `RocksDB` (when compiled in),
/// then an in-memory store.
async fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    if let Some(url) = &config.database_url {
        tracing::info!("Connecting to PostgreSQL");
        let store = PgStore::connect(url).await?;
        store.migrate().await?;
        return Ok(Arc::new(store));
    }

    #[cfg(feature = "rocksdb-backend")]
    if let Some(dir) = &config.data_dir {
        tracing::info!(path = %dir, "Opening RocksDB store");
        return Ok(Arc::new(pixelmint_store::RocksStore::open(dir)?));
    }

    tracing::warn!("No DATABASE_URL configured - using in-memory store, data will not persist");
    Ok(Arc::new(MemoryStore::new()))
}

async fn open_asset_store(
    config: &ServiceConfig,
) -> Result<Option<Arc<dyn AssetStore>>, Box<dyn std::error::Error>> {
    if let Some(bucket) = &config.asset_bucket {
        tracing::info!(bucket = %bucket, region = ?config.asset_region, "Using S3 asset store");
        let store = S3AssetStore::from_env(
            bucket.clone(),
            config.asset_region.clone(),
            config.asset_public_base_url.clone(),
        )
        .await;
        return Ok(Some(Arc::new(store)));
    }

    if let Some(dir) = &config.asset_local_dir {
        let Some(public_base) = &config.asset_public_base_url else {
            tracing::warn!("ASSET_LOCAL_DIR set without ASSET_PUBLIC_BASE_URL - ignoring");
            return Ok(None);
        };
        tracing::info!(path = %dir, "Using local asset store");
        let store = LocalAssetStore::new(dir, public_base.clone()).await?;
        return Ok(Some(Arc::new(store)));
    }

    Ok(None)
}
