//! Builder and vendor presets.

use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;

use super::client::{OpenAiCompatibleClient, OpenAiCompatibleConfig};
use crate::builder::{ProviderCore, resolve_secret};
use crate::defaults;
use crate::error::LlmError;
use crate::http::HttpConfig;

/// How the API key is presented and how endpoint URLs are formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`, URLs are `<base_url>/<path>`.
    Bearer,
    /// `api-key: <key>`, URLs are
    /// `<endpoint>/openai/deployments/<deployment>/<path>?api-version=<v>`.
    AzureApiKey {
        deployment: String,
        api_version: String,
    },
}

#[derive(Debug, Clone)]
pub struct OpenAiCompatibleBuilder {
    core: ProviderCore,
    provider: String,
    api_key: Option<SecretString>,
    api_key_env: String,
    base_url: String,
    model: String,
    auth: AuthStyle,
    include_stream_usage: bool,
}

impl OpenAiCompatibleBuilder {
    /// Any OpenAI-compatible endpoint.
    pub fn custom(
        provider: impl Into<String>,
        base_url: impl Into<String>,
        api_key_env: impl Into<String>,
    ) -> Self {
        Self {
            core: ProviderCore::default(),
            provider: provider.into(),
            api_key: None,
            api_key_env: api_key_env.into(),
            base_url: base_url.into(),
            model: String::new(),
            auth: AuthStyle::Bearer,
            include_stream_usage: true,
        }
    }

    pub fn openai() -> Self {
        Self::custom("openai", defaults::openai::BASE_URL, "OPENAI_API_KEY")
            .model(defaults::openai::CHAT_MODEL)
    }

    /// Azure OpenAI: `endpoint` is the resource URL, the deployment stands in
    /// for the model.
    pub fn azure(endpoint: impl Into<String>, deployment: impl Into<String>) -> Self {
        let deployment = deployment.into();
        let mut builder = Self::custom("azure", endpoint, "AZURE_OPENAI_API_KEY").model(&deployment);
        builder.auth = AuthStyle::AzureApiKey {
            deployment,
            api_version: defaults::azure::API_VERSION.to_string(),
        };
        builder
    }

    pub fn mistral() -> Self {
        let mut builder = Self::custom("mistral", defaults::mistral::BASE_URL, "MISTRAL_API_KEY")
            .model(defaults::mistral::CHAT_MODEL);
        builder.include_stream_usage = false;
        builder
    }

    /// DouBao on Volcengine Ark. The model is the Ark endpoint id and has no default.
    pub fn doubao() -> Self {
        Self::custom("doubao", defaults::doubao::BASE_URL, "ARK_API_KEY")
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

    /// Azure `api-version` query value; ignored for bearer vendors.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        if let AuthStyle::AzureApiKey { api_version, .. } = &mut self.auth {
            *api_version = version.into();
        }
        self
    }

    /// Ask for a final usage chunk when streaming (`stream_options.include_usage`).
    pub fn include_stream_usage(mut self, include: bool) -> Self {
        self.include_stream_usage = include;
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

    pub fn build(self) -> Result<OpenAiCompatibleClient, LlmError> {
        let api_key = resolve_secret(self.api_key, &self.api_key_env)?;
        if self.model.is_empty() {
            return Err(LlmError::ConfigurationError(format!(
                "{} requires a model",
                self.provider
            )));
        }
        if self.base_url.is_empty() {
            return Err(LlmError::ConfigurationError(format!(
                "{} requires a base URL",
                self.provider
            )));
        }
        let http = self.core.build_http_client()?;
        let config = OpenAiCompatibleConfig {
            provider: self.provider,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            api_key,
            auth: self.auth,
            model: self.model,
            include_stream_usage: self.include_stream_usage,
            extra_headers: self.core.http_config.headers,
        };
        Ok(OpenAiCompatibleClient::new(http, Arc::new(config)))
    }
}
