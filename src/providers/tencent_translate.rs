//! Tencent Machine Translation (`TextTranslateBatch`, TC3-signed).

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::tc3::{Tc3Credentials, Tc3Request, Tc3Signer};
use crate::builder::{ProviderCore, resolve_secret, resolve_value};
use crate::defaults::tencent_translate as defaults;
use crate::error::LlmError;
use crate::http::{HttpConfig, decode_json, post_raw, read_body};
use crate::providers::common::validate_translation;
use crate::traits::TranslationCapability;
use crate::types::{ResponseMetadata, TranslationRequest, TranslationResponse};

const PROVIDER: &str = "tencent_translate";

#[derive(Debug, Clone)]
pub struct TencentTranslateBuilder {
    core: ProviderCore,
    secret_id: Option<String>,
    secret_key: Option<SecretString>,
    base_url: Option<String>,
    region: String,
    project_id: i64,
}

impl Default for TencentTranslateBuilder {
    fn default() -> Self {
        Self {
            core: ProviderCore::default(),
            secret_id: None,
            secret_key: None,
            base_url: None,
            region: defaults::REGION.to_string(),
            project_id: 0,
        }
    }
}

impl TencentTranslateBuilder {
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

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn project_id(mut self, project_id: i64) -> Self {
        self.project_id = project_id;
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

    pub fn build(self) -> Result<TencentTranslateClient, LlmError> {
        let secret_id = resolve_value(self.secret_id, "TENCENTCLOUD_SECRET_ID")?;
        let secret_key = resolve_secret(self.secret_key, "TENCENTCLOUD_SECRET_KEY")?;
        let http = self.core.build_http_client()?;
        Ok(TencentTranslateClient {
            http,
            config: Arc::new(Config {
                signer: Tc3Signer::new(Tc3Credentials::new(
                    secret_id,
                    secret_key.expose_secret(),
                )),
                url: self
                    .base_url
                    .unwrap_or_else(|| format!("https://{}/", defaults::HOST)),
                region: self.region,
                project_id: self.project_id,
            }),
        })
    }
}

#[derive(Debug)]
struct Config {
    signer: Tc3Signer,
    url: String,
    region: String,
    project_id: i64,
}

#[derive(Debug, Clone)]
pub struct TencentTranslateClient {
    http: reqwest::Client,
    config: Arc<Config>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Response")]
    response: BatchResponse,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BatchResponse {
    source: Option<String>,
    #[serde(default)]
    target_text_list: Vec<String>,
    request_id: Option<String>,
    error: Option<VendorError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VendorError {
    code: String,
    message: String,
}

fn parse_batch_response(body: &str) -> Result<TranslationResponse, LlmError> {
    let envelope: Envelope = decode_json(PROVIDER, body)?;
    let response = envelope.response;
    if let Some(error) = response.error {
        tracing::warn!(provider = PROVIDER, code = %error.code, "vendor error");
        return Err(LlmError::provider(
            PROVIDER,
            error.message,
            Some(error.code),
            Some(body.to_string()),
        ));
    }
    Ok(TranslationResponse {
        translations: response.target_text_list,
        detected_source: response.source,
        metadata: ResponseMetadata::new(PROVIDER).with_request_id(response.request_id),
    })
}

#[async_trait]
impl TranslationCapability for TencentTranslateClient {
    async fn translate(
        &self,
        request: TranslationRequest,
    ) -> Result<TranslationResponse, LlmError> {
        validate_translation(&request)?;
        let body = json!({
            "SourceTextList": request.texts,
            "Source": request.source.as_deref().unwrap_or("auto"),
            "Target": request.target,
            "ProjectId": self.config.project_id,
        })
        .to_string();
        let headers = self.config.signer.headers(&Tc3Request {
            host: defaults::HOST,
            action: defaults::ACTION,
            version: defaults::VERSION,
            region: Some(self.config.region.as_str()),
            body: &body,
            timestamp: chrono::Utc::now().timestamp(),
        })?;

        let response = post_raw(&self.http, PROVIDER, &self.config.url, headers, body).await?;
        let text = read_body(PROVIDER, response).await?;
        let response = parse_batch_response(&text)?;
        if response.translations.len() != request.texts.len() {
            return Err(LlmError::provider(
                PROVIDER,
                format!(
                    "expected {} translations, got {}",
                    request.texts.len(),
                    response.translations.len()
                ),
                None,
                Some(text),
            ));
        }
        tracing::debug!(provider = PROVIDER, count = response.translations.len(), "translated");
        Ok(response)
    }
}
