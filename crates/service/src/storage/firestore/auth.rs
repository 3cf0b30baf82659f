//! OAuth access tokens for Firestore requests.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::storage::error::{StorageError, StorageResult};

const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Refresh this many seconds before the token actually expires.
const EXPIRY_SLACK_SECS: i64 = 60;

/// Where request bearer tokens come from.
pub enum TokenSource {
    ServiceAccount(ServiceAccountAuth),
    /// The local emulator accepts the fixed `owner` token.
    Emulator,
}

impl TokenSource {
    pub async fn bearer(&self, http: &reqwest::Client) -> StorageResult<String> {
        match self {
            Self::ServiceAccount(sa) => sa.access_token(http).await,
            Self::Emulator => Ok("owner".to_string()),
        }
    }
}

/// Service-account credentials exchanged for short-lived access tokens.
pub struct ServiceAccountAuth {
    client_email: String,
    key: EncodingKey,
    token_uri: String,
    cached: RwLock<Option<CachedToken>>,
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: i64,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 { 3600 }

/// Environment variables carry the PEM with literal `\n` sequences.
pub fn unescape_private_key(raw: &str) -> String {
    raw.replace("\\n", "\n")
}

impl ServiceAccountAuth {
    /// Fails when the private key is not a valid RSA PEM.
    pub fn new(client_email: &str, private_key: &str, token_uri: &str) -> StorageResult<Self> {
        let pem = unescape_private_key(private_key);
        let key = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| StorageError::Auth(format!("invalid service account private key: {e}")))?;
        Ok(Self {
            client_email: client_email.to_string(),
            key,
            token_uri: token_uri.to_string(),
            cached: RwLock::new(None),
        })
    }

    fn signed_assertion(&self, now: i64) -> StorageResult<String> {
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + 3600,
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| StorageError::Auth(format!("sign assertion: {e}")))
    }

    pub async fn access_token(&self, http: &reqwest::Client) -> StorageResult<String> {
        let now = Utc::now().timestamp();
        if let Some(token) = self.cached.read().await.as_ref() {
            if token.expires_at - EXPIRY_SLACK_SECS > now {
                return Ok(token.value.clone());
            }
        }

        let mut cached = self.cached.write().await;
        // another task may have refreshed while we waited for the write lock
        if let Some(token) = cached.as_ref() {
            if token.expires_at - EXPIRY_SLACK_SECS > now {
                return Ok(token.value.clone());
            }
        }

        let assertion = self.signed_assertion(now)?;
        let resp = http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(StorageError::Auth(format!("token exchange failed ({status}): {message}")));
        }
        let body: TokenResponse = resp.json().await?;
        debug!(expires_in = body.expires_in, "firestore access token refreshed");
        *cached = Some(CachedToken { value: body.access_token.clone(), expires_at: now + body.expires_in });
        Ok(body.access_token)
    }
}
