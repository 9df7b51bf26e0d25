use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::sync::Arc;

use super::transformers::{self, QianFanEventConverter};
use crate::auth::qianfan::AccessTokenProvider;
use crate::defaults;
use crate::error::LlmError;
use crate::http::{body_stream, post_with_query, read_body};
use crate::streaming::{chat_event_stream, sse_json_stream};
use crate::traits::ChatCapability;
use crate::types::{ChatRequest, ChatResponse, ChatStream};

pub(super) const PROVIDER: &str = "qianfan";

#[derive(Debug)]
struct QianFanConfig {
    base_url: String,
    model: String,
}

/// What the chat endpoint answered with.
enum Reply {
    Json(String),
    Events(reqwest::Response),
}

#[derive(Debug, Clone)]
pub struct QianFanClient {
    http: reqwest::Client,
    tokens: AccessTokenProvider,
    config: Arc<QianFanConfig>,
}

impl QianFanClient {
    pub(super) fn new(
        http: reqwest::Client,
        tokens: AccessTokenProvider,
        base_url: String,
        model: String,
    ) -> Self {
        Self {
            http,
            tokens,
            config: Arc::new(QianFanConfig { base_url, model }),
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn url(&self, model: &str) -> String {
        format!(
            "{}{}/{model}",
            self.config.base_url,
            defaults::qianfan::CHAT_PATH
        )
    }

    /// Send with the current access token. A stale-token answer drops the
    /// cached token so the next call fetches a fresh one; this call still
    /// fails with the vendor error.
    async fn send(&self, model: &str, body: &serde_json::Value) -> Result<Reply, LlmError> {
        let token = self.tokens.token().await?;
        let response = post_with_query(
            &self.http,
            PROVIDER,
            &self.url(model),
            HeaderMap::new(),
            &[("access_token", token.as_str())],
            body,
        )
        .await?;

        let is_event_stream = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/event-stream"));
        if is_event_stream {
            return Ok(Reply::Events(response));
        }

        let text = read_body(PROVIDER, response).await?;
        if transformers::is_token_error(&text) {
            tracing::warn!(provider = PROVIDER, "access token rejected, dropping cached token");
            self.tokens.invalidate();
        }
        Ok(Reply::Json(text))
    }
}

#[async_trait]
impl ChatCapability for QianFanClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let body = transformers::build_chat_body(&request, false)?;
        let model = request.settings.model_or(&self.config.model);
        match self.send(model, &body).await? {
            Reply::Json(text) => {
                let response = transformers::parse_chat_response(&text)?;
                tracing::debug!(provider = PROVIDER, id = ?response.metadata.id, "chat completed");
                Ok(response)
            }
            Reply::Events(_) => Err(LlmError::response_format(
                PROVIDER,
                "unexpected event stream",
                String::new(),
            )),
        }
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream, LlmError> {
        let body = transformers::build_chat_body(&request, true)?;
        let model = request.settings.model_or(&self.config.model);
        match self.send(model, &body).await? {
            Reply::Events(response) => {
                let documents = sse_json_stream(body_stream(response), PROVIDER);
                Ok(chat_event_stream(documents, QianFanEventConverter::new()))
            }
            // Errors arrive as a plain JSON body instead of an event stream.
            Reply::Json(text) => {
                transformers::parse_chat_response(&text)?;
                Err(LlmError::response_format(
                    PROVIDER,
                    "expected an event stream",
                    text,
                ))
            }
        }
    }
}
