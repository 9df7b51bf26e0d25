use secrecy::SecretString;
use std::time::Duration;

use super::client::DashScopeClient;
use crate::builder::{ProviderCore, resolve_secret};
use crate::defaults;
use crate::error::LlmError;
use crate::http::HttpConfig;

#[derive(Debug, Clone)]
pub struct DashScopeBuilder {
    core: ProviderCore,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
}

impl Default for DashScopeBuilder {
    fn default() -> Self {
        Self {
            core: ProviderCore::default(),
            api_key: None,
            base_url: defaults::dashscope::BASE_URL.to_string(),
            model: defaults::dashscope::CHAT_MODEL.to_string(),
        }
    }
}

impl DashScopeBuilder {
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

    pub fn build(self) -> Result<DashScopeClient, LlmError> {
        let api_key = resolve_secret(self.api_key, "DASHSCOPE_API_KEY")?;
        let http = self.core.build_http_client()?;
        Ok(DashScopeClient::new(
            http,
            api_key,
            self.base_url.trim_end_matches('/').to_string(),
            self.model,
            self.core.http_config.headers,
        ))
    }
}
