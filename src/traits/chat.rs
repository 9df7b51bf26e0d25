//! Chat capability trait

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::LlmError;
use crate::types::{ChatMessage, ChatRequest, ChatResponse, ChatStream};

#[async_trait]
pub trait ChatCapability: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError>;

    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream, LlmError>;

    /// Streaming chat that stops when `token` is cancelled.
    async fn chat_stream_with_cancel(
        &self,
        request: ChatRequest,
        token: CancellationToken,
    ) -> Result<ChatStream, LlmError> {
        let stream = self.chat_stream(request).await?;
        Ok(crate::streaming::make_cancellable_stream(stream, token))
    }

    /// Single-turn convenience with default settings.
    async fn ask(&self, prompt: String) -> Result<String, LlmError> {
        let response = self
            .chat(ChatRequest::new(vec![ChatMessage::user(prompt)]))
            .await?;
        Ok(response.content)
    }
}
