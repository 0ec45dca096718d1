//! Re-hosting of generated images.
//!
//! Provider URLs expire, so the workflow can download each image and store a
//! copy under a fresh key. [`AssetStore`] is the write side; backends are S3
//! and a local directory.

mod local;
mod s3;

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rand::Rng;

pub use local::LocalAssetStore;
pub use s3::S3AssetStore;

/// Content type of every stored asset.
pub const PNG_CONTENT_TYPE: &str = "image/png";

/// Errors from asset download or upload.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// Fetching the generated image failed.
    #[error("failed to download generated image: {0}")]
    Download(String),

    /// Writing to the asset store failed.
    #[error("failed to store image: {0}")]
    Upload(String),

    /// Local filesystem error.
    #[error("asset I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistent home for generated images.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store `bytes` under `key` and return the public URL of the copy.
    ///
    /// # Errors
    ///
    /// Returns `AssetError` if the write fails.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<String, AssetError>;
}

/// A fresh key: `{unix_millis}-{16 hex chars}.png`.
#[must_use]
pub fn asset_key() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());
    let suffix: u64 = rand::thread_rng().gen();
    format!("{millis}-{suffix:016x}.png")
}

/// Join a public base URL and a key.
pub(crate) fn public_url(base: &str, key: &str) -> String {
    format!("{}/{key}", base.trim_end_matches('/'))
}

/// Download the image at `url`.
///
/// # Errors
///
/// Returns `AssetError::Download` on transport failure or a non-2xx status.
pub async fn download(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, AssetError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AssetError::Download(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AssetError::Download(format!("HTTP {status}")));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AssetError::Download(e.to_string()))?;

    Ok(bytes.to_vec())
}
