use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use super::client::{HunYuanClient, HunYuanConfig};
use crate::auth::tc3::{Tc3Credentials, Tc3Signer};
use crate::builder::{ProviderCore, resolve_secret, resolve_value};
use crate::defaults;
use crate::error::LlmError;
use crate::http::HttpConfig;

#[derive(Debug, Clone)]
pub struct HunYuanBuilder {
    core: ProviderCore,
    secret_id: Option<String>,
    secret_key: Option<SecretString>,
    host: String,
    base_url: Option<String>,
    region: Option<String>,
    model: String,
}

impl Default for HunYuanBuilder {
    fn default() -> Self {
        Self {
            core: ProviderCore::default(),
            secret_id: None,
            secret_key: None,
            host: defaults::hunyuan::HOST.to_string(),
            base_url: None,
            region: None,
            model: defaults::hunyuan::CHAT_MODEL.to_string(),
        }
    }
}

impl HunYuanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn secret_id(mut self, secret_id: impl Into<String>) -> Self {
        self.secret_id = Some(secret_id.into());
        self
    }

    pub fn secret_key(mut self, secret_key: impl Into<String>) -> Self {
        self.secret_key = Some(SecretString::from(secret_key.into()));
        self
    }

    /// Host used for signing; the request goes to `https://<host>/` unless
    /// `base_url` overrides it.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
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

    pub fn build(self) -> Result<HunYuanClient, LlmError> {
        let secret_id = resolve_value(self.secret_id, "TENCENTCLOUD_SECRET_ID")?;
        let secret_key = resolve_secret(self.secret_key, "TENCENTCLOUD_SECRET_KEY")?;
        let http = self.core.build_http_client()?;
        let url = self
            .base_url
            .unwrap_or_else(|| format!("https://{}/", self.host));
        Ok(HunYuanClient::new(
            http,
            HunYuanConfig {
                signer: Tc3Signer::new(Tc3Credentials::new(
                    secret_id,
                    secret_key.expose_secret(),
                )),
                url,
                host: self.host,
                region: self.region,
                model: self.model,
            },
        ))
    }
}
