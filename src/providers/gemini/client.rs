use async_trait::async_trait;
use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::Arc;

use super::{streaming::GeminiEventConverter, transformers};
use crate::auth::extend_headers;
use crate::error::LlmError;
use crate::http::{body_stream, post_with_query, read_body};
use crate::streaming::{chat_event_stream, json_document_stream};
use crate::traits::ChatCapability;
use crate::types::{ChatRequest, ChatResponse, ChatStream};

pub(super) const PROVIDER: &str = "gemini";

#[derive(Debug)]
struct GeminiConfig {
    api_key: SecretString,
    base_url: String,
    model: String,
    extra_headers: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: Arc<GeminiConfig>,
}

impl GeminiClient {
    pub(super) fn new(
        http: reqwest::Client,
        api_key: SecretString,
        base_url: String,
        model: String,
        extra_headers: HashMap<String, String>,
    ) -> Self {
        Self {
            http,
            config: Arc::new(GeminiConfig {
                api_key,
                base_url,
                model,
                extra_headers,
            }),
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.config.base_url)
    }

    async fn send(
        &self,
        model: &str,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, LlmError> {
        post_with_query(
            &self.http,
            PROVIDER,
            &self.url(model, method),
            self.headers()?,
            &[("key", self.config.api_key.expose_secret())],
            body,
        )
        .await
    }

    fn headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = HeaderMap::new();
        extend_headers(&mut headers, &self.config.extra_headers)?;
        Ok(headers)
    }
}

#[async_trait]
impl ChatCapability for GeminiClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let body = transformers::build_generate_body(&request)?;
        let model = request.settings.model_or(&self.config.model);
        tracing::debug!(provider = PROVIDER, model, "generateContent");
        let response = self.send(model, "generateContent", &body).await?;
        let text = read_body(PROVIDER, response).await?;
        transformers::parse_generate_response(&text)
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream, LlmError> {
        let body = transformers::build_generate_body(&request)?;
        let model = request.settings.model_or(&self.config.model);
        let response = self.send(model, "streamGenerateContent", &body).await?;
        let documents = json_document_stream(body_stream(response));
        Ok(chat_event_stream(documents, GeminiEventConverter::new()))
    }
}
