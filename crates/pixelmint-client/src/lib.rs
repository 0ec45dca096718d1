//! Pixelmint Client SDK.
//!
//! A typed async client for the pixelmint HTTP API.
//!
//! # Example
//!
//! ```no_run
//! use pixelmint_client::PixelmintClient;
//!
//! # async fn example() -> Result<(), pixelmint_client::ClientError> {
//! let client = PixelmintClient::new("http://localhost:8080")?.with_token("session-jwt");
//!
//! let credits = client.credits().await?;
//! if credits > 0 {
//!     let image = client.create_image("A lighthouse on a cliff at dusk").await?;
//!     println!("Generated {}", image.url);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, PixelmintClient};
pub use error::ClientError;
pub use types::*;
