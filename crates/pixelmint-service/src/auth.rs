//! Authentication.
//!
//! Identity is delegated to the auth provider. Handlers take an [`AuthUser`]
//! extractor, which hands the bearer token to the [`Authenticator`] held in
//! [`AppState`]. Production uses [`JwksAuthenticator`]; tests inject their own.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;

use pixelmint_core::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// How long to cache JWKS keys before refreshing.
const JWKS_CACHE_DURATION: Duration = Duration::from_secs(3600);

/// Timeout for JWKS fetch requests.
const JWKS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves a bearer token to the user it was issued for.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Validate `token` and return the caller's ID.
    ///
    /// # Errors
    ///
    /// `ApiError::Unauthorized` for any token that does not check out.
    async fn authenticate(&self, token: &str) -> Result<UserId, ApiError>;
}

/// An authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user ID.
    pub user_id: UserId,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        let user_id = state.auth.authenticate(token).await?;
        Ok(Self { user_id })
    }
}

/// JWT claims we rely on.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Issuer.
    pub iss: String,
    /// Expiration time.
    pub exp: i64,
}

/// JWKS (JSON Web Key Set) response structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwks {
    /// List of JWK keys.
    pub keys: Vec<Jwk>,
}

/// Single JSON Web Key.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type (e.g., "RSA").
    pub kty: String,
    /// Key ID.
    pub kid: Option<String>,
    /// RSA public key modulus (base64url encoded).
    pub n: Option<String>,
    /// RSA public key exponent (base64url encoded).
    pub e: Option<String>,
}

struct KeyCache {
    keys: HashMap<String, DecodingKey>,
    default_key: Option<DecodingKey>,
    fetched_at: Option<Instant>,
}

impl KeyCache {
    fn is_fresh(&self) -> bool {
        self.fetched_at
            .is_some_and(|at| at.elapsed() < JWKS_CACHE_DURATION)
    }

    fn lookup(&self, kid: Option<&str>) -> Option<DecodingKey> {
        match kid {
            Some(kid) => self.keys.get(kid).cloned(),
            None => self.default_key.clone(),
        }
    }
}

/// Validates RS256 JWTs against the issuer's published key set.
pub struct JwksAuthenticator {
    client: reqwest::Client,
    issuer: String,
    audience: Option<String>,
    cache: RwLock<KeyCache>,
}

impl JwksAuthenticator {
    /// Create an authenticator for tokens issued by `issuer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(issuer: impl Into<String>, audience: Option<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(JWKS_FETCH_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            issuer: issuer.into(),
            audience,
            cache: RwLock::new(KeyCache {
                keys: HashMap::new(),
                default_key: None,
                fetched_at: None,
            }),
        })
    }

    async fn decoding_key(&self, kid: Option<&str>) -> Result<DecodingKey, ApiError> {
        {
            let cache = self.cache.read().await;
            if cache.is_fresh() {
                if let Some(key) = cache.lookup(kid) {
                    return Ok(key);
                }
            }
        }

        // Stale cache or unknown kid: refetch.
        let jwks = self.fetch_jwks().await?;

        let mut cache = self.cache.write().await;
        cache.keys.clear();
        cache.default_key = None;
        cache.fetched_at = Some(Instant::now());

        for jwk in &jwks.keys {
            if let Some(key) = jwk_to_decoding_key(jwk) {
                if let Some(kid) = &jwk.kid {
                    cache.keys.insert(kid.clone(), key.clone());
                }
                if cache.default_key.is_none() {
                    cache.default_key = Some(key);
                }
            }
        }

        cache.lookup(kid).ok_or(ApiError::Unauthorized)
    }

    async fn fetch_jwks(&self) -> Result<Jwks, ApiError> {
        let url = format!("{}/.well-known/jwks.json", self.issuer);
        tracing::debug!(url = %url, "Fetching JWKS");

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::error!(error = %e, url = %url, "Failed to fetch JWKS");
            ApiError::Unauthorized
        })?;

        if !response.status().is_success() {
            tracing::error!(status = %response.status(), url = %url, "JWKS fetch failed");
            return Err(ApiError::Unauthorized);
        }

        let jwks: Jwks = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse JWKS response");
            ApiError::Unauthorized
        })?;

        tracing::info!(keys_count = jwks.keys.len(), "JWKS fetched");
        Ok(jwks)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        match &self.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        validation
    }
}

#[async_trait]
impl Authenticator for JwksAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<UserId, ApiError> {
        let header = decode_header(token).map_err(|e| {
            tracing::debug!(error = %e, "Failed to decode JWT header");
            ApiError::Unauthorized
        })?;

        let key = self.decoding_key(header.kid.as_deref()).await?;

        let data = decode::<JwtClaims>(token, &key, &self.validation()).map_err(|e| {
            tracing::debug!(error = %e, "JWT validation failed");
            ApiError::Unauthorized
        })?;

        data.claims.sub.parse().map_err(|_| ApiError::Unauthorized)
    }
}

/// Convert a JWK to a `DecodingKey`. Only RSA keys are supported.
fn jwk_to_decoding_key(jwk: &Jwk) -> Option<DecodingKey> {
    if jwk.kty != "RSA" {
        tracing::debug!(kty = %jwk.kty, "Skipping non-RSA JWK");
        return None;
    }

    let n = jwk.n.as_ref()?;
    let e = jwk.e.as_ref()?;

    DecodingKey::from_rsa_components(n, e).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_rsa_keys_are_skipped() {
        let jwk = Jwk {
            kty: "EC".into(),
            kid: Some("k1".into()),
            n: None,
            e: None,
        };
        assert!(jwk_to_decoding_key(&jwk).is_none());
    }

    #[test]
    fn rsa_keys_need_components() {
        let jwk = Jwk {
            kty: "RSA".into(),
            kid: None,
            n: Some("AQAB".into()),
            e: Some("AQAB".into()),
        };
        assert!(jwk_to_decoding_key(&jwk).is_some());

        let jwk = Jwk { e: None, ..jwk };
        assert!(jwk_to_decoding_key(&jwk).is_none());
    }

    #[tokio::test]
    async fn garbage_tokens_are_rejected_without_fetching() {
        let auth = JwksAuthenticator::new("http://127.0.0.1:9", None).unwrap();
        let result = auth.authenticate("not-a-jwt").await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[test]
    fn audience_is_optional() {
        let auth = JwksAuthenticator::new("https://issuer.example", None).unwrap();
        assert!(!auth.validation().validate_aud);

        let auth =
            JwksAuthenticator::new("https://issuer.example", Some("pixelmint".into())).unwrap();
        assert!(auth.validation().validate_aud);
    }
}
