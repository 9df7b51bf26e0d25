use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use super::client::{SparkDeskClient, SparkDeskConfig};
use crate::auth::spark::SparkCredentials;
use crate::builder::{resolve_secret, resolve_value};
use crate::defaults;
use crate::error::LlmError;

#[derive(Debug, Clone)]
pub struct SparkDeskBuilder {
    app_id: Option<String>,
    api_key: Option<String>,
    api_secret: Option<SecretString>,
    ws_url: String,
    domain: String,
    connect_timeout: Duration,
}

impl Default for SparkDeskBuilder {
    fn default() -> Self {
        Self {
            app_id: None,
            api_key: None,
            api_secret: None,
            ws_url: defaults::sparkdesk::WS_URL.to_string(),
            domain: defaults::sparkdesk::DOMAIN.to_string(),
            connect_timeout: defaults::http::CONNECT_TIMEOUT,
        }
    }
}

impl SparkDeskBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn api_secret(mut self, api_secret: impl Into<String>) -> Self {
        self.api_secret = Some(SecretString::from(api_secret.into()));
        self
    }

    /// Versioned chat URL, e.g. `wss://spark-api.xf-yun.com/v4.0/chat`.
    pub fn ws_url(mut self, ws_url: impl Into<String>) -> Self {
        self.ws_url = ws_url.into();
        self
    }

    /// Model domain matching the URL version (`generalv3.5`, `4.0Ultra`, ...).
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<SparkDeskClient, LlmError> {
        let app_id = resolve_value(self.app_id, "SPARK_APP_ID")?;
        let api_key = resolve_value(self.api_key, "SPARK_API_KEY")?;
        let api_secret = resolve_secret(self.api_secret, "SPARK_API_SECRET")?;
        if !self.ws_url.starts_with("wss://") && !self.ws_url.starts_with("ws://") {
            return Err(LlmError::ConfigurationError(format!(
                "SparkDesk URL must be ws:// or wss://: {}",
                self.ws_url
            )));
        }
        Ok(SparkDeskClient::new(SparkDeskConfig {
            credentials: SparkCredentials::new(app_id, api_key, api_secret.expose_secret()),
            ws_url: self.ws_url,
            domain: self.domain,
            connect_timeout: self.connect_timeout,
        }))
    }
}
