use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::sync::Arc;

use super::transformers::{self, HunYuanEventConverter};
use crate::auth::tc3::{Tc3Request, Tc3Signer};
use crate::defaults;
use crate::error::LlmError;
use crate::http::{body_stream, post_raw, read_body};
use crate::streaming::{chat_event_stream, sse_json_stream};
use crate::traits::ChatCapability;
use crate::types::{ChatRequest, ChatResponse, ChatStream};

pub(super) const PROVIDER: &str = "hunyuan";

#[derive(Debug)]
pub(super) struct HunYuanConfig {
    pub signer: Tc3Signer,
    pub url: String,
    pub host: String,
    pub region: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct HunYuanClient {
    http: reqwest::Client,
    config: Arc<HunYuanConfig>,
}

impl HunYuanClient {
    pub(super) fn new(http: reqwest::Client, config: HunYuanConfig) -> Self {
        Self {
            http,
            config: Arc::new(config),
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn signed_headers(&self, body: &str) -> Result<HeaderMap, LlmError> {
        self.config.signer.headers(&Tc3Request {
            host: &self.config.host,
            action: defaults::hunyuan::ACTION,
            version: defaults::hunyuan::VERSION,
            region: self.config.region.as_deref(),
            body,
            timestamp: chrono::Utc::now().timestamp(),
        })
    }

    async fn send(
        &self,
        request: &ChatRequest,
        stream: bool,
    ) -> Result<reqwest::Response, LlmError> {
        let body = transformers::build_chat_body(request, &self.config.model, stream)?;
        let body = serde_json::to_string(&body)?;
        let headers = self.signed_headers(&body)?;
        post_raw(&self.http, PROVIDER, &self.config.url, headers, body).await
    }
}

#[async_trait]
impl ChatCapability for HunYuanClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let response = self.send(&request, false).await?;
        let text = read_body(PROVIDER, response).await?;
        let response = transformers::parse_chat_response(&text)?;
        tracing::debug!(
            provider = PROVIDER,
            request_id = ?response.metadata.request_id,
            "chat completed"
        );
        Ok(response)
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream, LlmError> {
        let response = self.send(&request, true).await?;

        // Failures before the first token come back as a plain JSON envelope.
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));
        if is_json {
            let text = read_body(PROVIDER, response).await?;
            transformers::parse_chat_response(&text)?;
            return Err(LlmError::response_format(
                PROVIDER,
                "expected an event stream",
                text,
            ));
        }

        let documents = sse_json_stream(body_stream(response), PROVIDER);
        Ok(chat_event_stream(documents, HunYuanEventConverter::new()))
    }
}
