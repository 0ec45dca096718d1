//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{checkout, credits, health, images, prompts, webhooks};
use crate::state::AppState;

/// Maximum concurrent requests for API endpoints.
///
/// Image generation holds a request open for the whole upstream call, so
/// this bounds the number of in-flight generations.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Liveness
/// - `GET /health/ready` - Readiness (store ping)
/// - `GET /v1/images` - Global feed
/// - `GET /v1/prompts/random` - Random suggested prompt
///
/// ## Credits (bearer auth)
/// - `GET /v1/credits` - Current balance, creating the account on first read
/// - `POST /v1/credits/decrement` - Spend one credit
/// - `POST /v1/checkout/:credits` - Start a Stripe checkout for a package
///
/// ## Images (bearer auth)
/// - `POST /v1/images` - Generate an image
/// - `GET /v1/images/mine` - Caller's images
/// - `GET /v1/images/latest` - Caller's latest image
/// - `DELETE /v1/images/:id` - Delete one of the caller's images
///
/// ## Webhooks (signature verification)
/// - `POST /webhooks/stripe` - Stripe events
pub fn create_router(state: AppState) -> Router {
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Credits
        .route("/credits", get(credits::get_credits))
        .route("/credits/decrement", post(credits::decrement_credit))
        .route("/checkout/:credits", post(checkout::create_checkout))
        // Images
        .route(
            "/images",
            get(images::list_images).post(images::create_image),
        )
        .route("/images/mine", get(images::list_my_images))
        .route("/images/latest", get(images::latest_image))
        .route("/images/:id", delete(images::delete_image))
        // Prompts
        .route("/prompts/random", get(prompts::random_prompt))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .nest("/v1", api_routes)
        // Webhooks (no rate limit - controlled by Stripe)
        .route("/webhooks/stripe", post(webhooks::stripe_webhook))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
