//! OpenAI-compatible client.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use secrecy::SecretString;
use std::collections::HashMap;
use std::sync::Arc;

use super::builder::AuthStyle;
use super::{streaming::OpenAiEventConverter, transformers};
use crate::auth::{api_key_header, bearer_headers, extend_headers};
use crate::error::LlmError;
use crate::http::{body_stream, post_json, post_stream};
use crate::streaming::{chat_event_stream, sse_json_stream};
use crate::traits::ChatCapability;
use crate::types::{ChatRequest, ChatResponse, ChatStream};

#[derive(Debug)]
pub(crate) struct OpenAiCompatibleConfig {
    pub provider: String,
    pub base_url: String,
    pub api_key: SecretString,
    pub auth: AuthStyle,
    pub model: String,
    pub include_stream_usage: bool,
    pub extra_headers: HashMap<String, String>,
}

/// Chat, image and speech client for OpenAI-compatible APIs.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    config: Arc<OpenAiCompatibleConfig>,
}

impl OpenAiCompatibleClient {
    pub(crate) fn new(http: reqwest::Client, config: Arc<OpenAiCompatibleConfig>) -> Self {
        Self { http, config }
    }

    pub fn provider(&self) -> &str {
        &self.config.provider
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        match &self.config.auth {
            AuthStyle::Bearer => format!("{}/{path}", self.config.base_url),
            AuthStyle::AzureApiKey {
                deployment,
                api_version,
            } => format!(
                "{}/openai/deployments/{deployment}/{path}?api-version={api_version}",
                self.config.base_url
            ),
        }
    }

    pub(crate) fn headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = match self.config.auth {
            AuthStyle::Bearer => bearer_headers(&self.config.api_key)?,
            AuthStyle::AzureApiKey { .. } => api_key_header("api-key", &self.config.api_key)?,
        };
        extend_headers(&mut headers, &self.config.extra_headers)?;
        Ok(headers)
    }
}

#[async_trait]
impl ChatCapability for OpenAiCompatibleClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let body = transformers::build_chat_body(&request, &self.config.model, false, false)?;
        let text = post_json(
            &self.http,
            self.provider(),
            &self.endpoint("chat/completions"),
            self.headers()?,
            &body,
        )
        .await?;
        let response = transformers::parse_chat_response(self.provider(), &text)?;
        tracing::debug!(
            provider = self.provider(),
            finish_reason = ?response.finish_reason,
            "chat completed"
        );
        Ok(response)
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream, LlmError> {
        let body = transformers::build_chat_body(
            &request,
            &self.config.model,
            true,
            self.config.include_stream_usage,
        )?;
        let response = post_stream(
            &self.http,
            self.provider(),
            &self.endpoint("chat/completions"),
            self.headers()?,
            &body,
        )
        .await?;
        let documents = sse_json_stream(body_stream(response), self.provider());
        Ok(chat_event_stream(
            documents,
            OpenAiEventConverter::new(self.provider()),
        ))
    }
}
