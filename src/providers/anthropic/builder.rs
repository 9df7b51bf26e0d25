use secrecy::SecretString;
use std::time::Duration;

use super::client::AnthropicClient;
use crate::builder::{ProviderCore, resolve_secret};
use crate::defaults;
use crate::error::LlmError;
use crate::http::HttpConfig;

#[derive(Debug, Clone)]
pub struct AnthropicBuilder {
    core: ProviderCore,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
    api_version: String,
}

impl Default for AnthropicBuilder {
    fn default() -> Self {
        Self {
            core: ProviderCore::default(),
            api_key: None,
            base_url: defaults::anthropic::BASE_URL.to_string(),
            model: defaults::anthropic::CHAT_MODEL.to_string(),
            api_version: defaults::anthropic::API_VERSION.to_string(),
        }
    }
}

impl AnthropicBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// `anthropic-version` header value.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
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

    pub fn build(self) -> Result<AnthropicClient, LlmError> {
        let api_key = resolve_secret(self.api_key, "ANTHROPIC_API_KEY")?;
        let http = self.core.build_http_client()?;
        Ok(AnthropicClient::new(
            http,
            api_key,
            self.base_url.trim_end_matches('/').to_string(),
            self.model,
            self.api_version,
            self.core.http_config.headers,
        ))
    }
}
