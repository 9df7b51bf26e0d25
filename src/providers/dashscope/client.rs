use async_trait::async_trait;
use reqwest::header::HeaderMap;
use secrecy::SecretString;
use std::collections::HashMap;
use std::sync::Arc;

use super::transformers::{self, DashScopeEventConverter};
use crate::auth::{bearer_headers, extend_headers, insert_header};
use crate::error::LlmError;
use crate::http::{body_stream, post_json, post_stream};
use crate::streaming::{chat_event_stream, sse_json_stream};
use crate::traits::ChatCapability;
use crate::types::{ChatRequest, ChatResponse, ChatStream};

pub(super) const PROVIDER: &str = "dashscope";
const GENERATION_PATH: &str = "services/aigc/text-generation/generation";

#[derive(Debug)]
struct DashScopeConfig {
    api_key: SecretString,
    base_url: String,
    model: String,
    extra_headers: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct DashScopeClient {
    http: reqwest::Client,
    config: Arc<DashScopeConfig>,
}

impl DashScopeClient {
    pub(super) fn new(
        http: reqwest::Client,
        api_key: SecretString,
        base_url: String,
        model: String,
        extra_headers: HashMap<String, String>,
    ) -> Self {
        Self {
            http,
            config: Arc::new(DashScopeConfig {
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

    fn url(&self) -> String {
        format!("{}/{GENERATION_PATH}", self.config.base_url)
    }

    fn headers(&self, stream: bool) -> Result<HeaderMap, LlmError> {
        let mut headers = bearer_headers(&self.config.api_key)?;
        if stream {
            insert_header(&mut headers, "x-dashscope-sse", "enable")?;
            insert_header(&mut headers, "accept", "text/event-stream")?;
        }
        extend_headers(&mut headers, &self.config.extra_headers)?;
        Ok(headers)
    }
}

#[async_trait]
impl ChatCapability for DashScopeClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let body = transformers::build_generation_body(&request, &self.config.model, false)?;
        let text = post_json(&self.http, PROVIDER, &self.url(), self.headers(false)?, &body).await?;
        let response = transformers::parse_generation_response(&text)?;
        tracing::debug!(
            provider = PROVIDER,
            request_id = ?response.metadata.request_id,
            "chat completed"
        );
        Ok(response)
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream, LlmError> {
        let body = transformers::build_generation_body(&request, &self.config.model, true)?;
        let response =
            post_stream(&self.http, PROVIDER, &self.url(), self.headers(true)?, &body).await?;
        let documents = sse_json_stream(body_stream(response), PROVIDER);
        Ok(chat_event_stream(documents, DashScopeEventConverter::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::dashscope::DashScopeBuilder;
    use crate::types::{ChatMessage, ChatStreamEvent};
    use futures::StreamExt;

    fn client(url: String) -> DashScopeClient {
        DashScopeBuilder::new()
            .api_key("ds-key")
            .base_url(url)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn stream_sets_sse_header_and_incremental_output() {
        let mut server = mockito::Server::new_async().await;
        let sse = concat!(
            "id:1\nevent:result\n:HTTP_STATUS/200\ndata:{\"output\":{\"choices\":[{\"message\":{\"content\":\"你\",\"role\":\"assistant\"},\"finish_reason\":\"null\"}]},\"usage\":{\"input_tokens\":3,\"output_tokens\":1,\"total_tokens\":4},\"request_id\":\"r1\"}\n\n",
            "id:2\nevent:result\n:HTTP_STATUS/200\ndata:{\"output\":{\"choices\":[{\"message\":{\"content\":\"好\",\"role\":\"assistant\"},\"finish_reason\":\"stop\"}]},\"usage\":{\"input_tokens\":3,\"output_tokens\":2,\"total_tokens\":5},\"request_id\":\"r1\"}\n\n",
        );
        let mock = server
            .mock("POST", "/services/aigc/text-generation/generation")
            .match_header("x-dashscope-sse", "enable")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "parameters": {"result_format": "message", "incremental_output": true}
            })))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(sse)
            .create_async()
            .await;

        let events: Vec<_> = client(server.url())
            .chat_stream(ChatRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .unwrap()
            .collect()
            .await;
        let text: String = events
            .iter()
            .filter_map(|e| e.as_ref().ok().and_then(ChatStreamEvent::as_content_delta))
            .collect();
        assert_eq!(text, "你好");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_keeps_vendor_body() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/services/aigc/text-generation/generation")
            .with_status(400)
            .with_body(r#"{"code":"DataInspectionFailed","message":"Input data may contain inappropriate content.","request_id":"r2"}"#)
            .create_async()
            .await;

        let err = client(server.url())
            .chat(ChatRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(400));
        assert!(err.raw_body().unwrap().contains("DataInspectionFailed"));
    }
}
