use async_trait::async_trait;
use futures::SinkExt;
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

use super::transformers::{self, SparkEventConverter};
use crate::auth::spark::{SparkCredentials, signed_url};
use crate::error::LlmError;
use crate::streaming::{chat_event_stream, collect_chat_response, websocket_json_stream};
use crate::traits::ChatCapability;
use crate::types::{ChatRequest, ChatResponse, ChatStream};

pub(super) const PROVIDER: &str = "sparkdesk";

#[derive(Debug)]
pub(super) struct SparkDeskConfig {
    pub credentials: SparkCredentials,
    pub ws_url: String,
    pub domain: String,
    pub connect_timeout: Duration,
}

/// One WebSocket connection per request; the socket closes when the stream
/// ends or is dropped.
#[derive(Debug, Clone)]
pub struct SparkDeskClient {
    config: Arc<SparkDeskConfig>,
}

impl SparkDeskClient {
    pub(super) fn new(config: SparkDeskConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn domain(&self) -> &str {
        &self.config.domain
    }
}

#[async_trait]
impl ChatCapability for SparkDeskClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let response = collect_chat_response(self.chat_stream(request).await?).await?;
        tracing::debug!(provider = PROVIDER, sid = ?response.metadata.id, "chat completed");
        Ok(response)
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream, LlmError> {
        let body = transformers::build_chat_frame(
            &request,
            &self.config.credentials.app_id,
            &self.config.domain,
        )?;
        let url = signed_url(&self.config.credentials, &self.config.ws_url, chrono::Utc::now())?;

        tracing::debug!(provider = PROVIDER, url = %self.config.ws_url, "opening websocket");
        let (mut socket, _) =
            tokio::time::timeout(self.config.connect_timeout, tokio_tungstenite::connect_async(url))
                .await
                .map_err(|_| {
                    LlmError::WebSocketError(format!(
                        "{PROVIDER} connect timed out after {:?}",
                        self.config.connect_timeout
                    ))
                })??;
        socket.send(Message::Text(body.to_string().into())).await?;

        let documents = websocket_json_stream(socket, PROVIDER, transformers::classify_frame);
        Ok(chat_event_stream(documents, SparkEventConverter::new()))
    }
}
