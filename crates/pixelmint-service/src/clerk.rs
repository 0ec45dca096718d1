//! Author lookups against the Clerk backend API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use pixelmint_core::UserId;

/// Clerk backend API base URL.
pub const CLERK_API_URL: &str = "https://api.clerk.com";

/// Most users fetched in one lookup.
const MAX_USERS_PER_LOOKUP: usize = 100;

/// Public profile of an image author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// User ID.
    pub id: String,
    /// Display name, if the user set one.
    #[serde(default)]
    pub username: Option<String>,
    /// Avatar URL.
    #[serde(default, alias = "image_url")]
    pub profile_image_url: Option<String>,
}

/// Errors from the user directory.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The directory returned an error status.
    #[error("user directory returned {0}")]
    Status(u16),
}

/// Resolves user IDs to public profiles.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up the given users. Unknown IDs are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be queried.
    async fn lookup(&self, ids: &[UserId]) -> Result<Vec<Author>, DirectoryError>;
}

/// [`UserDirectory`] backed by `GET /v1/users`.
#[derive(Debug, Clone)]
pub struct ClerkDirectory {
    client: Client,
    secret_key: String,
    base_url: String,
}

impl ClerkDirectory {
    /// Create a directory client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(secret_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            client,
            secret_key: secret_key.into(),
            base_url: CLERK_API_URL.to_string(),
        })
    }

    /// Point the client at a different API host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl UserDirectory for ClerkDirectory {
    async fn lookup(&self, ids: &[UserId]) -> Result<Vec<Author>, DirectoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: Vec<(&str, String)> = ids
            .iter()
            .take(MAX_USERS_PER_LOOKUP)
            .map(|id| ("user_id", id.to_string()))
            .collect();
        query.push(("limit", MAX_USERS_PER_LOOKUP.to_string()));

        let response = self
            .client
            .get(format!("{}/v1/users", self.base_url))
            .bearer_auth(&self.secret_key)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ids(raw: &[&str]) -> Vec<UserId> {
        raw.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[tokio::test]
    async fn looks_up_users() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/users"))
            .and(header("authorization", "Bearer sk_clerk"))
            .and(query_param("user_id", "user_a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "user_a", "username": "alice", "image_url": "https://img.clerk.com/a"},
                {"id": "user_b", "username": null}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let directory = ClerkDirectory::new("sk_clerk")
            .unwrap()
            .with_base_url(server.uri());
        let authors = directory.lookup(&ids(&["user_a", "user_b"])).await.unwrap();

        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].username.as_deref(), Some("alice"));
        assert_eq!(
            authors[0].profile_image_url.as_deref(),
            Some("https://img.clerk.com/a")
        );
        assert!(authors[1].username.is_none());
    }

    #[tokio::test]
    async fn empty_lookup_skips_request() {
        let directory = ClerkDirectory::new("sk_clerk")
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        assert!(directory.lookup(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let directory = ClerkDirectory::new("bad")
            .unwrap()
            .with_base_url(server.uri());
        let err = directory.lookup(&ids(&["user_a"])).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Status(401)));
    }
}
