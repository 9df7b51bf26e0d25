use secrecy::SecretString;
use std::time::Duration;

use super::client::QianFanClient;
use crate::auth::qianfan::AccessTokenProvider;
use crate::builder::{ProviderCore, resolve_secret, resolve_value};
use crate::defaults;
use crate::error::LlmError;
use crate::http::HttpConfig;

#[derive(Debug, Clone)]
pub struct QianFanBuilder {
    core: ProviderCore,
    api_key: Option<String>,
    secret_key: Option<SecretString>,
    base_url: String,
    model: String,
}

impl Default for QianFanBuilder {
    fn default() -> Self {
        Self {
            core: ProviderCore::default(),
            api_key: None,
            secret_key: None,
            base_url: defaults::qianfan::BASE_URL.to_string(),
            model: defaults::qianfan::CHAT_MODEL.to_string(),
        }
    }
}

impl QianFanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn secret_key(mut self, secret_key: impl Into<String>) -> Self {
        self.secret_key = Some(SecretString::from(secret_key.into()));
        self
    }

    /// Base URL for both the token and the chat endpoints.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Endpoint name appended to the chat path (e.g. `completions_pro`).
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.core = self.core.timeout(timeout);
        self
    }

    pub fn http_config(mut self, config: HttpConfig) -> Self {
        self.core = self.core.http_config(config);
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.core = self.core.with_http_client(client);
        self
    }

    pub fn build(self) -> Result<QianFanClient, LlmError> {
        let api_key = resolve_value(self.api_key, "QIANFAN_API_KEY")?;
        let secret_key = resolve_secret(self.secret_key, "QIANFAN_SECRET_KEY")?;
        let http = self.core.build_http_client()?;
        let tokens = AccessTokenProvider::new(
            http.clone(),
            format!("{}{}", self.base_url, defaults::qianfan::TOKEN_PATH),
            api_key,
            secret_key,
        );
        Ok(QianFanClient::new(http, tokens, self.base_url, self.model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_secret_is_reported() {
        if std::env::var("QIANFAN_SECRET_KEY").is_ok() {
            return;
        }
        let err = QianFanBuilder::new().api_key("ak").build().unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey(m) if m.contains("QIANFAN_SECRET_KEY")));
    }
}
