//! Cancelling a stream through `chat_stream_with_cancel`

use futures_util::StreamExt;
use kernel_connectors::prelude::*;
use kernel_connectors::providers::openai_compatible::OpenAiCompatibleBuilder;
use kernel_connectors::streaming::make_cancellable_stream;
use std::time::Duration;

use crate::support::stream_fixture::load_fixture;

#[tokio::test]
async fn cancelled_token_stops_connector_stream() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(load_fixture("tests/fixtures/openai/text_and_tool_call.sse"))
        .create_async()
        .await;
    let client = OpenAiCompatibleBuilder::openai()
        .api_key("sk-test")
        .base_url(server.url())
        .build()
        .unwrap();

    let token = CancellationToken::new();
    let mut stream = client
        .chat_stream_with_cancel(
            ChatRequest::new(vec![ChatMessage::user("hi")]),
            token.clone(),
        )
        .await
        .unwrap();

    assert!(matches!(
        stream.next().await,
        Some(Ok(ChatStreamEvent::StreamStart { .. }))
    ));
    token.cancel();
    assert!(matches!(stream.next().await, Some(Err(LlmError::Cancelled))));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn cancel_interrupts_a_pending_read() {
    let pending: ChatStream = Box::pin(futures_util::stream::pending());
    let token = CancellationToken::new();
    let mut stream = make_cancellable_stream(pending, token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });
    let item = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("cancellation must wake the reader");
    assert!(matches!(item, Some(Err(LlmError::Cancelled))));
    canceller.await.unwrap();
}
