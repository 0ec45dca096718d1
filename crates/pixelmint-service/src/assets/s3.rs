//! S3 asset store.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use super::{public_url, AssetError, AssetStore};

/// Uploads assets to an S3 bucket.
#[derive(Debug, Clone)]
pub struct S3AssetStore {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3AssetStore {
    /// Wrap an already configured S3 client.
    #[must_use]
    pub fn new(
        client: Client,
        bucket: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base_url: public_base_url.into(),
        }
    }

    /// Build a client from the ambient AWS configuration (environment,
    /// profile, instance role), optionally pinning the region.
    ///
    /// When `public_base_url` is `None` the bucket's virtual-hosted URL is
    /// used.
    pub async fn from_env(
        bucket: impl Into<String>,
        region: Option<String>,
        public_base_url: Option<String>,
    ) -> Self {
        let bucket = bucket.into();

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region.clone() {
            loader = loader.region(Region::new(region));
        }
        let sdk_config = loader.load().await;

        let public_base_url = public_base_url.unwrap_or_else(|| match &region {
            Some(region) => format!("https://{bucket}.s3.{region}.amazonaws.com"),
            None => format!("https://{bucket}.s3.amazonaws.com"),
        });

        Self::new(Client::new(&sdk_config), bucket, public_base_url)
    }
}

#[async_trait]
impl AssetStore for S3AssetStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AssetError> {
        let size = bytes.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(bucket = %self.bucket, key = %key, error = ?e, "S3 upload failed");
                AssetError::Upload(e.to_string())
            })?;

        tracing::debug!(bucket = %self.bucket, key = %key, size, "Uploaded asset");
        Ok(public_url(&self.public_base_url, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::Credentials;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(endpoint: &str) -> Client {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version_latest()
            .region(Region::new("us-east-1"))
            .endpoint_url(endpoint)
            .credentials_provider(Credentials::new("test", "test", None, None, "test"))
            .force_path_style(true)
            .build();
        Client::from_conf(config)
    }

    #[tokio::test]
    async fn uploads_with_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/pixelmint-assets/1-abc.png"))
            .and(header("content-type", "image/png"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let store = S3AssetStore::new(
            client_for(&server.uri()),
            "pixelmint-assets",
            "https://cdn.example.com",
        );
        let url = store
            .put("1-abc.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();

        assert_eq!(url, "https://cdn.example.com/1-abc.png");
    }

    #[tokio::test]
    async fn upload_failures_are_storage_errors() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                "<Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>",
            ))
            .mount(&server)
            .await;

        let store = S3AssetStore::new(client_for(&server.uri()), "pixelmint-assets", "https://cdn");
        let err = store.put("k.png", vec![], "image/png").await.unwrap_err();
        assert!(matches!(err, AssetError::Upload(_)));
    }
}
