use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use moka::future::Cache;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::services::error::StoreError;

pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_CACHE_KEY: &str = "access_token";

/// The parts of a Google service account key file we need
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: Option<String>,
    pub client_email: String,
    pub private_key: String,
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        serde_json::from_str(json)
            .map_err(|e| StoreError::Auth(format!("Invalid Firebase credentials JSON: {}", e)))
    }
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchanges signed service account assertions for OAuth access tokens.
/// Tokens live an hour; they are cached for 50 minutes.
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    http: Client,
    tokens: Cache<&'static str, Arc<str>>,
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey, http: Client) -> Result<Self, StoreError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| StoreError::Auth(format!("Invalid service account private key: {}", e)))?;

        let tokens = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(50 * 60))
            .build();

        Ok(Self { key, encoding_key, http, tokens })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn assertion(&self) -> Result<String, StoreError> {
        let now = Utc::now();
        let claims = AssertionClaims {
            iss: self.key.client_email.clone(),
            scope: DATASTORE_SCOPE.to_string(),
            aud: self.key.token_uri.clone(),
            iat: now.timestamp(),
            exp: (now + ChronoDuration::hours(1)).timestamp(),
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| StoreError::Auth(format!("Failed to sign service account assertion: {}", e)))
    }

    async fn fetch_token(&self) -> Result<Arc<str>, StoreError> {
        let assertion = self.assertion()?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Token endpoint rejected {}: {} {}", self.key.client_email, status, body);
            return Err(StoreError::Auth(format!("Token endpoint returned {}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Auth(format!("Malformed token response: {}", e)))?;

        info!("Obtained Firestore access token for {}", self.key.client_email);
        Ok(Arc::from(token.access_token))
    }

    /// A valid access token, fetched on first use and after expiry
    pub async fn access_token(&self) -> Result<Arc<str>, StoreError> {
        self.tokens
            .try_get_with(TOKEN_CACHE_KEY, self.fetch_token())
            .await
            .map_err(|e| StoreError::Auth(e.to_string()))
    }
}
