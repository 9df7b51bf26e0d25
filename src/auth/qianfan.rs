//! Baidu QianFan OAuth access tokens.
//!
//! The token is checked and refreshed lazily before each call. No lock is held
//! across the refresh request, so concurrent callers may refresh twice; the
//! second token simply replaces the first.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::{Arc, Mutex};

use crate::error::LlmError;

/// Refresh this many seconds before the vendor-reported expiry.
const EXPIRY_SAFETY_WINDOW: i64 = 300;

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    exp_unix: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: i64,
    error: Option<String>,
    error_description: Option<String>,
}

/// Exchanges an API key/secret pair for an access token and caches it.
#[derive(Clone)]
pub struct AccessTokenProvider {
    http: reqwest::Client,
    token_url: String,
    api_key: String,
    secret_key: SecretString,
    cache: Arc<Mutex<Option<CachedToken>>>,
}

impl AccessTokenProvider {
    pub fn new(
        http: reqwest::Client,
        token_url: impl Into<String>,
        api_key: impl Into<String>,
        secret_key: SecretString,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            api_key: api_key.into(),
            secret_key,
            cache: Arc::new(Mutex::new(None)),
        }
    }

    fn cached(&self, now: i64) -> Option<String> {
        let guard = self.cache.lock().ok()?;
        guard
            .as_ref()
            .filter(|t| t.exp_unix - EXPIRY_SAFETY_WINDOW > now)
            .map(|t| t.token.clone())
    }

    fn store(&self, token: String, expires_in: i64, now: i64) {
        if let Ok(mut guard) = self.cache.lock() {
            *guard = Some(CachedToken {
                token,
                exp_unix: now + expires_in,
            });
        }
    }

    /// Drop the cached token so the next call fetches a new one.
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.cache.lock() {
            *guard = None;
        }
    }

    /// A valid access token, refreshing when missing or about to expire.
    pub async fn token(&self) -> Result<String, LlmError> {
        let now = chrono::Utc::now().timestamp();
        if let Some(token) = self.cached(now) {
            return Ok(token);
        }

        tracing::debug!(url = %self.token_url, "refreshing QianFan access token");
        let response = self
            .http
            .post(&self.token_url)
            .query(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.api_key.as_str()),
                ("client_secret", self.secret_key.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| {
                LlmError::HttpError(format!("QianFan token request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| {
                LlmError::HttpError(format!("QianFan token body read failed: {}", e.without_url()))
            })?;
        if !status.is_success() {
            return Err(LlmError::ApiError {
                code: status.as_u16(),
                message: "QianFan token request rejected".to_string(),
                details: Some(serde_json::Value::String(body)),
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::response_format("qianfan", e, body.clone()))?;
        match parsed.access_token {
            Some(token) if parsed.error.is_none() => {
                self.store(token.clone(), parsed.expires_in, now);
                Ok(token)
            }
            _ => Err(LlmError::AuthenticationError(format!(
                "QianFan token refused: {} {}",
                parsed.error.unwrap_or_default(),
                parsed.error_description.unwrap_or_default()
            ))),
        }
    }
}

impl std::fmt::Debug for AccessTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenProvider")
            .field("token_url", &self.token_url)
            .field("api_key", &self.api_key)
            .finish()
    }
}
