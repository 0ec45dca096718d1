//! Local directory asset store.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::{public_url, AssetError, AssetStore};

/// Writes assets into a directory served at `public_base_url`.
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    base_path: PathBuf,
    public_base_url: String,
}

impl LocalAssetStore {
    /// Create a store rooted at `base_path`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn new(
        base_path: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
    ) -> Result<Self, AssetError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await?;

        Ok(Self {
            base_path,
            public_base_url: public_base_url.into(),
        })
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, AssetError> {
        if key.contains('/') || key.contains("..") {
            return Err(AssetError::Upload(format!("invalid asset key: {key}")));
        }

        let path = self.base_path.join(key);
        fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), "Stored asset locally");

        Ok(public_url(&self.public_base_url, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn writes_file_and_returns_url() {
        let dir = TempDir::new().unwrap();
        let store = LocalAssetStore::new(dir.path().join("assets"), "http://localhost:8080/assets")
            .await
            .unwrap();

        let url = store
            .put("1-abc.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:8080/assets/1-abc.png");
        let written = std::fs::read(dir.path().join("assets/1-abc.png")).unwrap();
        assert_eq!(written, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let dir = TempDir::new().unwrap();
        let store = LocalAssetStore::new(dir.path(), "http://localhost")
            .await
            .unwrap();

        let err = store.put("../x.png", vec![], "image/png").await.unwrap_err();
        assert!(matches!(err, AssetError::Upload(_)));
    }
}
