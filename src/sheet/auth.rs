#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{path::Path, sync::Mutex};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use super::SheetError;
use crate::constants::SHEETS_SCOPE;

/// Lifetime requested for each signed assertion, in seconds.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Cached tokens are refreshed this many seconds before they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Grant type of the JWT-bearer token exchange.
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Supplies bearer tokens for the Sheets API.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Returns a currently valid access token.
    async fn access_token(&self, client: &reqwest::Client) -> Result<String, SheetError>;
}

/// A fixed, pre-issued access token.
#[derive(Clone, Debug)]
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self, _client: &reqwest::Client) -> Result<String, SheetError> {
        Ok(self.0.clone())
    }
}

/// Fields of a service-account key file this crate uses.
#[derive(Clone, Debug, Deserialize)]
pub struct ServiceAccountKey {
    /// Account e-mail, the assertion issuer.
    pub client_email:   String,
    /// PEM-encoded RSA private key.
    pub private_key:    String,
    /// Key identifier placed in the JWT header.
    #[serde(default)]
    pub private_key_id: Option<String>,
    /// OAuth token endpoint.
    pub token_uri:      String,
}

/// Claims of the signed assertion.
#[derive(Serialize)]
struct AssertionClaims<'a> {
    /// Issuer.
    iss:   &'a str,
    /// Requested scope.
    scope: &'a str,
    /// Audience, the token endpoint.
    aud:   &'a str,
    /// Issued at.
    iat:   i64,
    /// Expiry.
    exp:   i64,
}

/// Successful token endpoint response.
#[derive(Deserialize)]
struct TokenResponse {
    /// Bearer token.
    access_token: String,
    /// Lifetime in seconds.
    #[serde(default = "default_expires_in")]
    expires_in:   i64,
}

/// Token lifetime assumed when the endpoint omits it.
fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

/// A token along with its absolute expiry.
#[derive(Clone)]
struct CachedToken {
    /// Bearer token.
    token:      String,
    /// Unix timestamp after which the token is stale.
    expires_at: i64,
}

/// Exchanges signed service-account assertions for access tokens, caching
/// each token until shortly before it expires.
pub struct ServiceAccountAuth {
    /// Parsed key file.
    key:    ServiceAccountKey,
    /// Signing key derived from `key.private_key`.
    signer: EncodingKey,
    /// Most recent token.
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    /// Builds the authenticator from a parsed key.
    pub fn new(key: ServiceAccountKey) -> Result<Self, SheetError> {
        let signer = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| SheetError::Auth(format!("invalid service account private key: {e}")))?;
        Ok(Self {
            key,
            signer,
            cached: Mutex::new(None),
        })
    }

    /// Reads a service-account JSON key file.
    pub fn from_file(path: &Path) -> Result<Self, SheetError> {
        let json = std::fs::read_to_string(path)?;
        let key: ServiceAccountKey = serde_json::from_str(&json).map_err(|e| {
            SheetError::Auth(format!("{} is not a service account key: {e}", path.display()))
        })?;
        Self::new(key)
    }

    /// Service-account e-mail.
    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Signs an assertion issued at `now`.
    fn assertion(&self, now: i64) -> Result<String, SheetError> {
        let claims = AssertionClaims {
            iss:   &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud:   &self.key.token_uri,
            iat:   now,
            exp:   now + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        encode(&header, &claims, &self.signer)
            .map_err(|e| SheetError::Auth(format!("could not sign assertion: {e}")))
    }

    /// Returns the cached token if it is still fresh at `now`.
    fn fresh_cached(&self, now: i64) -> Option<String> {
        self.cached
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .filter(|c| now < c.expires_at - EXPIRY_MARGIN_SECS)
            .map(|c| c.token.clone())
    }
}

#[async_trait]
impl TokenSource for ServiceAccountAuth {
    async fn access_token(&self, client: &reqwest::Client) -> Result<String, SheetError> {
        let now = Utc::now().timestamp();
        if let Some(token) = self.fresh_cached(now) {
            return Ok(token);
        }

        let assertion = self.assertion(now)?;
        let response = client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetError::Auth(format!("token endpoint returned {status}: {body}")));
        }

        let token: TokenResponse = response.json().await?;
        tracing::debug!("Obtained access token for {}", self.key.client_email);

        *self.cached.lock().unwrap_or_else(|e| e.into_inner()) = Some(CachedToken {
            token:      token.access_token.clone(),
            expires_at: now + token.expires_in,
        });
        Ok(token.access_token)
    }
}
