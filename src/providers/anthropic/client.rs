use async_trait::async_trait;
use reqwest::header::HeaderMap;
use secrecy::SecretString;
use std::collections::HashMap;
use std::sync::Arc;

use super::{streaming::AnthropicEventConverter, transformers};
use crate::auth::{api_key_header, extend_headers, insert_header};
use crate::error::LlmError;
use crate::http::{body_stream, post_json, post_stream};
use crate::streaming::{chat_event_stream, sse_json_stream};
use crate::traits::ChatCapability;
use crate::types::{ChatRequest, ChatResponse, ChatStream};

pub(super) const PROVIDER: &str = "anthropic";

#[derive(Debug)]
struct AnthropicConfig {
    api_key: SecretString,
    base_url: String,
    model: String,
    api_version: String,
    extra_headers: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    config: Arc<AnthropicConfig>,
}

impl AnthropicClient {
    pub(super) fn new(
        http: reqwest::Client,
        api_key: SecretString,
        base_url: String,
        model: String,
        api_version: String,
        extra_headers: HashMap<String, String>,
    ) -> Self {
        Self {
            http,
            config: Arc::new(AnthropicConfig {
                api_key,
                base_url,
                model,
                api_version,
                extra_headers,
            }),
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url)
    }

    fn headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = api_key_header("x-api-key", &self.config.api_key)?;
        insert_header(&mut headers, "anthropic-version", &self.config.api_version)?;
        extend_headers(&mut headers, &self.config.extra_headers)?;
        Ok(headers)
    }
}

#[async_trait]
impl ChatCapability for AnthropicClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let body = transformers::build_messages_body(&request, &self.config.model, false)?;
        let text = post_json(&self.http, PROVIDER, &self.url(), self.headers()?, &body).await?;
        let response = transformers::parse_messages_response(&text)?;
        tracing::debug!(provider = PROVIDER, finish_reason = ?response.finish_reason, "chat completed");
        Ok(response)
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream, LlmError> {
        let body = transformers::build_messages_body(&request, &self.config.model, true)?;
        let response = post_stream(&self.http, PROVIDER, &self.url(), self.headers()?, &body).await?;
        let documents = sse_json_stream(body_stream(response), PROVIDER);
        Ok(chat_event_stream(documents, AnthropicEventConverter::new()))
    }
}
