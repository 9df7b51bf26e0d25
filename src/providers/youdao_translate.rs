//! Youdao open-platform text translation (`/api`, v3 signature).

use async_trait::async_trait;
use secrecy::SecretString;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::youdao::{SIGN_TYPE, sign};
use crate::builder::{ProviderCore, resolve_secret, resolve_value};
use crate::defaults;
use crate::error::LlmError;
use crate::http::{HttpConfig, decode_json, post_form};
use crate::providers::common::validate_translation;
use crate::traits::TranslationCapability;
use crate::types::{ResponseMetadata, TranslationRequest, TranslationResponse};

const PROVIDER: &str = "youdao";

#[derive(Debug, Clone)]
pub struct YoudaoTranslateBuilder {
    core: ProviderCore,
    app_key: Option<String>,
    app_secret: Option<SecretString>,
    base_url: String,
}

impl Default for YoudaoTranslateBuilder {
    fn default() -> Self {
        Self {
            core: ProviderCore::default(),
            app_key: None,
            app_secret: None,
            base_url: defaults::youdao::BASE_URL.to_string(),
        }
    }
}

impl YoudaoTranslateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app_key(mut self, app_key: impl Into<String>) -> Self {
        self.app_key = Some(app_key.into());
        self
    }

    pub fn app_secret(mut self, app_secret: impl Into<String>) -> Self {
        self.app_secret = Some(SecretString::from(app_secret.into()));
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
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

    pub fn build(self) -> Result<YoudaoTranslateClient, LlmError> {
        let app_key = resolve_value(self.app_key, "YOUDAO_APP_KEY")?;
        let app_secret = resolve_secret(self.app_secret, "YOUDAO_APP_SECRET")?;
        let http = self.core.build_http_client()?;
        Ok(YoudaoTranslateClient {
            http,
            config: Arc::new(Config {
                app_key,
                app_secret,
                base_url: self.base_url,
            }),
        })
    }
}

#[derive(Debug)]
struct Config {
    app_key: String,
    app_secret: SecretString,
    base_url: String,
}

/// Translates one text per request; batches are sent sequentially.
#[derive(Debug, Clone)]
pub struct YoudaoTranslateClient {
    http: reqwest::Client,
    config: Arc<Config>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    error_code: String,
    #[serde(default)]
    translation: Vec<String>,
    /// `"<from>2<to>"`, e.g. `en2zh-CHS`.
    l: Option<String>,
    request_id: Option<String>,
}

struct Translated {
    text: String,
    detected: Option<String>,
    request_id: Option<String>,
}

fn parse_response(body: &str) -> Result<Translated, LlmError> {
    let parsed: ApiResponse = decode_json(PROVIDER, body)?;
    if parsed.error_code != "0" {
        tracing::warn!(provider = PROVIDER, code = %parsed.error_code, "vendor error");
        return Err(LlmError::provider(
            PROVIDER,
            format!("Youdao returned errorCode {}", parsed.error_code),
            Some(parsed.error_code),
            Some(body.to_string()),
        ));
    }
    let detected = parsed
        .l
        .as_deref()
        .and_then(|l| l.split_once('2'))
        .map(|(from, _)| from.to_string());
    let text = parsed.translation.into_iter().next().ok_or_else(|| {
        LlmError::provider(
            PROVIDER,
            "response contained no translation",
            None,
            Some(body.to_string()),
        )
    })?;
    Ok(Translated {
        text,
        detected,
        request_id: parsed.request_id,
    })
}

impl YoudaoTranslateClient {
    async fn translate_one(
        &self,
        q: &str,
        from: &str,
        to: &str,
    ) -> Result<Translated, LlmError> {
        let salt = uuid::Uuid::new_v4().to_string();
        let curtime = chrono::Utc::now().timestamp();
        let signature = sign(&self.config.app_key, &self.config.app_secret, q, &salt, curtime);
        let form = [
            ("q", q.to_string()),
            ("from", from.to_string()),
            ("to", to.to_string()),
            ("appKey", self.config.app_key.clone()),
            ("salt", salt),
            ("sign", signature),
            ("signType", SIGN_TYPE.to_string()),
            ("curtime", curtime.to_string()),
        ];
        let url = format!("{}/api", self.config.base_url);
        let body = post_form(&self.http, PROVIDER, &url, &form).await?;
        parse_response(&body)
    }
}

#[async_trait]
impl TranslationCapability for YoudaoTranslateClient {
    async fn translate(
        &self,
        request: TranslationRequest,
    ) -> Result<TranslationResponse, LlmError> {
        validate_translation(&request)?;
        let from = request.source.as_deref().unwrap_or("auto");

        let mut translations = Vec::with_capacity(request.texts.len());
        let mut detected_source = None;
        let mut request_id = None;
        for text in &request.texts {
            let translated = self.translate_one(text, from, &request.target).await?;
            translations.push(translated.text);
            detected_source = detected_source.or(translated.detected);
            request_id = translated.request_id.or(request_id);
        }
        tracing::debug!(provider = PROVIDER, count = translations.len(), "translated");
        Ok(TranslationResponse {
            translations,
            detected_source,
            metadata: ResponseMetadata::new(PROVIDER).with_request_id(request_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(url: String) -> YoudaoTranslateClient {
        YoudaoTranslateBuilder::new()
            .app_key("yd-app")
            .app_secret("yd-secret")
            .base_url(url)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn form_carries_v3_signature() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "hello".into()),
                Matcher::UrlEncoded("from".into(), "auto".into()),
                Matcher::UrlEncoded("to".into(), "zh-CHS".into()),
                Matcher::UrlEncoded("appKey".into(), "yd-app".into()),
                Matcher::UrlEncoded("signType".into(), "v3".into()),
                Matcher::Regex("sign=[0-9a-f]{64}".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"errorCode":"0","query":"hello","translation":["你好"],"l":"en2zh-CHS","requestId":"yd-1"}"#)
            .create_async()
            .await;

        let response = client(server.url())
            .translate(TranslationRequest::new("hello", "zh-CHS"))
            .await
            .unwrap();
        assert_eq!(response.translations, vec!["你好"]);
        assert_eq!(response.detected_source.as_deref(), Some("en"));
        mock.assert_async().await;
    }

    #[test]
    fn nonzero_error_code_is_provider_error() {
        let err = parse_response(r#"{"errorCode":"108","l":"en2zh-CHS"}"#)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            LlmError::ProviderError { error_code: Some(ref c), .. } if c == "108"
        ));
    }
}
