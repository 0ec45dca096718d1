//! Pixelmint HTTP API service.
//!
//! Users buy credit packages through Stripe Checkout and spend one credit per
//! generated image. This crate wires the HTTP surface to its collaborators:
//!
//! - Credit balance and decrement
//! - Checkout session creation and the Stripe webhook that credits purchases
//! - Image generation, feed listing and deletion
//! - Suggested prompts
//!
//! # Authentication
//!
//! User requests carry a bearer JWT from the auth provider. Validation goes
//! through the [`Authenticator`](auth::Authenticator) stored in [`AppState`],
//! so tests and deployments can supply their own.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)]

pub mod assets;
pub mod auth;
pub mod clerk;
pub mod config;
pub mod crypto;
pub mod error;
pub mod generation;
pub mod handlers;
pub mod routes;
pub mod seed;
pub mod state;
pub mod stripe;
pub mod workflow;

pub use auth::{AuthUser, Authenticator, JwksAuthenticator};
pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
pub use stripe::{StripeClient, StripeError};
