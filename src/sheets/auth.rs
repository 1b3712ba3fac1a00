// src/sheets/auth.rs
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tokio::sync::Mutex;

pub const SCOPE_READONLY: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
pub const SCOPE_READ_WRITE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Assertion lifetime; the token endpoint rejects anything over one hour.
const ASSERTION_TTL_SECS: i64 = 3600;
/// Refresh this long before the token actually expires.
pub const EXPIRY_SLACK_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The subset of a service-account key file the sync needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_json(s: &str) -> Result<Self> {
        let key: ServiceAccountKey =
            serde_json::from_str(s).context("parsing service account json")?;
        if key.client_email.trim().is_empty() {
            bail!("service account json has an empty client_email");
        }
        Ok(key)
    }
}

/// Load the credential file.
///
/// `Ok(None)` means the file is absent, which callers treat as "no remote
/// access" rather than a failure. An unreadable or malformed file is an error.
pub fn load_credentials(path: &Path) -> Result<Option<ServiceAccountKey>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading service account from {}", path.display()))?;
    ServiceAccountKey::from_json(&content)
        .with_context(|| format!("invalid service account file {}", path.display()))
        .map(Some)
}

#[async_trait::async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Fixed bearer token; handy for tests and for tokens minted elsewhere.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait::async_trait]
impl AccessTokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Service-account JWT-bearer flow with an in-process token cache.
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scope: String,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    /// Fails when the key file carries no usable RSA private key.
    pub fn new(key: ServiceAccountKey, scope: &str, http: reqwest::Client) -> Result<Self> {
        if key.private_key.trim().is_empty() {
            bail!("service account {} has no private_key", key.client_email);
        }
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .context("service account private_key is not a valid RSA PEM")?;
        Ok(Self {
            key,
            encoding_key,
            scope: scope.to_string(),
            http,
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_TTL_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        jsonwebtoken::encode(&header, &claims, &self.encoding_key)
            .context("signing service account assertion")
    }

    async fn request_token(&self) -> Result<CachedToken> {
        let now = Utc::now();
        let assertion = self.signed_assertion(now)?;
        let resp = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .context("token endpoint request")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("token endpoint returned {status}: {body}"));
        }
        let tok: TokenResponse = resp.json().await.context("token endpoint json")?;
        let ttl = tok.expires_in.unwrap_or(ASSERTION_TTL_SECS);
        Ok(CachedToken {
            value: tok.access_token,
            expires_at: now + ChronoDuration::seconds(ttl),
        })
    }
}

#[async_trait::async_trait]
impl AccessTokenProvider for ServiceAccountAuth {
    async fn access_token(&self) -> Result<String> {
        let mut guard = self.cached.lock().await;
        if let Some(tok) = guard.as_ref() {
            if tok.expires_at - ChronoDuration::seconds(EXPIRY_SLACK_SECS) > Utc::now() {
                return Ok(tok.value.clone());
            }
        }
        let fresh = self.request_token().await?;
        let value = fresh.value.clone();
        *guard = Some(fresh);
        Ok(value)
    }
}
