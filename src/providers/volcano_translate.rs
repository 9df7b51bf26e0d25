//! Volcano Engine machine translation (`TranslateText`).

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::volcano::{VolcanoCredentials, VolcanoRequest, VolcanoSigner};
use crate::builder::{ProviderCore, resolve_secret, resolve_value};
use crate::defaults::volcano_translate as defaults;
use crate::error::LlmError;
use crate::http::{HttpConfig, decode_json, post_raw, read_body};
use crate::providers::common::validate_translation;
use crate::traits::TranslationCapability;
use crate::types::{ResponseMetadata, TranslationRequest, TranslationResponse};

const PROVIDER: &str = "volcano_translate";

#[derive(Debug, Clone)]
pub struct VolcanoTranslateBuilder {
    core: ProviderCore,
    access_key: Option<String>,
    secret_key: Option<SecretString>,
    base_url: Option<String>,
    region: String,
}

impl Default for VolcanoTranslateBuilder {
    fn default() -> Self {
        Self {
            core: ProviderCore::default(),
            access_key: None,
            secret_key: None,
            base_url: None,
            region: defaults::REGION.to_string(),
        }
    }
}

impl VolcanoTranslateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn access_key(mut self, access_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self
    }

    pub fn secret_key(mut self, secret_key: impl Into<String>) -> Self {
        self.secret_key = Some(SecretString::from(secret_key.into()));
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
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

    pub fn build(self) -> Result<VolcanoTranslateClient, LlmError> {
        let access_key = resolve_value(self.access_key, "VOLC_ACCESSKEY")?;
        let secret_key = resolve_secret(self.secret_key, "VOLC_SECRETKEY")?;
        let http = self.core.build_http_client()?;
        Ok(VolcanoTranslateClient {
            http,
            config: Arc::new(Config {
                signer: VolcanoSigner::new(VolcanoCredentials::new(
                    access_key,
                    secret_key.expose_secret(),
                )),
                base_url: self
                    .base_url
                    .unwrap_or_else(|| format!("https://{}", defaults::HOST)),
                region: self.region,
            }),
        })
    }
}

#[derive(Debug)]
struct Config {
    signer: VolcanoSigner,
    base_url: String,
    region: String,
}

#[derive(Debug, Clone)]
pub struct VolcanoTranslateClient {
    http: reqwest::Client,
    config: Arc<Config>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TranslateTextResponse {
    #[serde(default)]
    translation_list: Vec<TranslationItem>,
    response_metadata: Option<ResponseMetadataDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TranslationItem {
    translation: String,
    detected_source_language: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResponseMetadataDto {
    request_id: Option<String>,
    error: Option<VendorError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VendorError {
    code: String,
    #[serde(default)]
    message: String,
}

fn build_body(request: &TranslationRequest) -> Value {
    let mut body = Map::new();
    if let Some(source) = request.source.as_deref().filter(|s| !s.is_empty() && *s != "auto") {
        body.insert("SourceLanguage".into(), json!(source));
    }
    body.insert("TargetLanguage".into(), json!(request.target));
    body.insert("TextList".into(), json!(request.texts));
    Value::Object(body)
}

fn parse_response(body: &str) -> Result<TranslationResponse, LlmError> {
    let parsed: TranslateTextResponse = decode_json(PROVIDER, body)?;
    let (request_id, error) = match parsed.response_metadata {
        Some(m) => (m.request_id, m.error),
        None => (None, None),
    };
    if let Some(error) = error {
        tracing::warn!(provider = PROVIDER, code = %error.code, "vendor error");
        return Err(LlmError::provider(
            PROVIDER,
            error.message,
            Some(error.code),
            Some(body.to_string()),
        ));
    }

    let detected_source = parsed
        .translation_list
        .iter()
        .find_map(|t| t.detected_source_language.clone());
    Ok(TranslationResponse {
        translations: parsed
            .translation_list
            .into_iter()
            .map(|t| t.translation)
            .collect(),
        detected_source,
        metadata: ResponseMetadata::new(PROVIDER).with_request_id(request_id),
    })
}

#[async_trait]
impl TranslationCapability for VolcanoTranslateClient {
    async fn translate(
        &self,
        request: TranslationRequest,
    ) -> Result<TranslationResponse, LlmError> {
        validate_translation(&request)?;
        let body = build_body(&request).to_string();
        let query = [("Action", defaults::ACTION), ("Version", defaults::VERSION)];
        let headers = self.config.signer.headers(&VolcanoRequest {
            method: "POST",
            host: defaults::HOST,
            path: "/",
            query: &query,
            region: &self.config.region,
            service: defaults::SERVICE,
            body: &body,
            timestamp: chrono::Utc::now(),
        })?;
        let url = format!(
            "{}/?{}",
            self.config.base_url,
            VolcanoSigner::canonical_query(&query)
        );

        let response = post_raw(&self.http, PROVIDER, &url, headers, body).await?;
        let text = read_body(PROVIDER, response).await?;
        let response = parse_response(&text)?;
        tracing::debug!(provider = PROVIDER, count = response.translations.len(), "translated");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(url: String) -> VolcanoTranslateClient {
        VolcanoTranslateBuilder::new()
            .access_key("AKLTtest")
            .secret_key("volc-secret")
            .base_url(url)
            .build()
            .unwrap()
    }

    #[test]
    fn auto_source_is_left_to_detection() {
        let body = build_body(&TranslationRequest::new("hi", "zh").from_language("auto"));
        assert!(body.get("SourceLanguage").is_none());
        let body = build_body(&TranslationRequest::new("hi", "zh").from_language("en"));
        assert_eq!(body["SourceLanguage"], "en");
    }

    #[tokio::test]
    async fn translate_signs_action_and_version_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("Action".into(), "TranslateText".into()),
                Matcher::UrlEncoded("Version".into(), "2020-06-01".into()),
            ]))
            .match_header(
                "authorization",
                Matcher::Regex(r"^HMAC-SHA256 Credential=AKLTtest/\d{8}/cn-north-1/translate/request".into()),
            )
            .match_header("x-date", Matcher::Regex(r"^\d{8}T\d{6}Z$".into()))
            .match_body(Matcher::PartialJson(json!({"TargetLanguage": "zh", "TextList": ["hello"]})))
            .with_status(200)
            .with_body(r#"{"TranslationList":[{"Translation":"你好","DetectedSourceLanguage":"en","Extra":null}],
                "ResponseMetadata":{"RequestId":"2024-r","Action":"TranslateText","Version":"2020-06-01","Service":"translate","Region":"cn-north-1"}}"#)
            .create_async()
            .await;

        let response = client(server.url())
            .translate(TranslationRequest::new("hello", "zh"))
            .await
            .unwrap();
        assert_eq!(response.translations, vec!["你好"]);
        assert_eq!(response.detected_source.as_deref(), Some("en"));
        assert_eq!(response.metadata.request_id.as_deref(), Some("2024-r"));
        mock.assert_async().await;
    }

    #[test]
    fn metadata_error_is_provider_error() {
        let body = r#"{"ResponseMetadata":{"RequestId":"r","Error":{"Code":"SignatureDoesNotMatch","Message":"bad signature"}}}"#;
        match parse_response(body).unwrap_err() {
            LlmError::ProviderError { error_code, message, .. } => {
                assert_eq!(error_code.as_deref(), Some("SignatureDoesNotMatch"));
                assert_eq!(message, "bad signature");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
