//! SSE streams replayed through the connectors

use futures_util::StreamExt;
use kernel_connectors::prelude::*;
use kernel_connectors::providers::dashscope::DashScopeBuilder;
use kernel_connectors::providers::hunyuan::HunYuanBuilder;
use kernel_connectors::providers::openai_compatible::OpenAiCompatibleBuilder;

use crate::support::stream_fixture::{content_of, load_fixture};

/// The mock is returned alongside the server; dropping it unregisters it.
async fn sse_server(path: &str, fixture: &str) -> (mockito::ServerGuard, mockito::Mock) {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", path)
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(load_fixture(fixture))
        .create_async()
        .await;
    (server, mock)
}

#[tokio::test]
async fn openai_text_then_tool_call_collects_into_response() {
    let (server, _mock) = sse_server(
        "/chat/completions",
        "tests/fixtures/openai/text_and_tool_call.sse",
    )
    .await;
    let client = OpenAiCompatibleBuilder::openai()
        .api_key("sk-test")
        .base_url(server.url())
        .build()
        .unwrap();

    let stream = client
        .chat_stream(ChatRequest::new(vec![ChatMessage::user("Weather in Paris?")]))
        .await
        .unwrap();
    let response = collect_chat_response(stream).await.unwrap();

    assert_eq!(response.content, "Let me check.");
    assert_eq!(response.tool_calls.len(), 1);
    assert_eq!(response.tool_calls[0].id, "call_abc");
    assert_eq!(response.tool_calls[0].name, "get_weather");
    assert_eq!(
        response.tool_calls[0].arguments_json().unwrap(),
        serde_json::json!({"city": "Paris"})
    );
    assert_eq!(response.finish_reason, Some(FinishReason::ToolCalls));
    assert_eq!(response.usage.total_tokens, 21);
    assert_eq!(response.metadata.model.as_deref(), Some("gpt-4o-mini"));

    // The collected response continues the conversation as an assistant turn.
    let next = response.to_message();
    assert_eq!(next.role, MessageRole::Assistant);
    assert!(next.has_tool_calls());
}

#[tokio::test]
async fn dashscope_incremental_output_is_concatenated() {
    let (server, _mock) = sse_server(
        "/services/aigc/text-generation/generation",
        "tests/fixtures/dashscope/incremental.sse",
    )
    .await;
    let client = DashScopeBuilder::new()
        .api_key("ds-key")
        .base_url(server.url())
        .build()
        .unwrap();

    let events: Vec<_> = client
        .chat_stream(ChatRequest::new(vec![ChatMessage::user("你是谁")]))
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(content_of(&events), "通义千问");
    let response = collect_chat_response(Box::pin(futures_util::stream::iter(events)))
        .await
        .unwrap();
    assert_eq!(response.usage.total_tokens, 7);
    assert_eq!(response.finish_reason, Some(FinishReason::Stop));
}

#[tokio::test]
async fn hunyuan_sensitive_finish_ends_stream_with_error() {
    let (server, _mock) = sse_server("/", "tests/fixtures/hunyuan/sensitive.sse").await;
    let client = HunYuanBuilder::new()
        .secret_id("AKIDTEST")
        .secret_key("SECRETTEST")
        .base_url(server.url())
        .build()
        .unwrap();

    let events: Vec<_> = client
        .chat_stream(ChatRequest::new(vec![ChatMessage::user("...")]))
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(content_of(&events), "这个");
    match events.last() {
        Some(Err(LlmError::ProviderError { error_code, .. })) => {
            assert_eq!(error_code.as_deref(), Some("sensitive"))
        }
        other => panic!("unexpected last item: {other:?}"),
    }
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, Ok(ChatStreamEvent::StreamEnd { .. })))
    );
}
