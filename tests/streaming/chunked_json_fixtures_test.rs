//! Chunked JSON array streams (Gemini `streamGenerateContent`)

use futures_util::StreamExt;
use kernel_connectors::prelude::*;
use kernel_connectors::providers::gemini::GeminiBuilder;
use kernel_connectors::streaming::json_document_stream;
use proptest::prelude::*;

use crate::support::stream_fixture::{content_of, load_fixture, rechunk};

const FIXTURE: &str = "tests/fixtures/gemini/stream_array.json";

async fn documents(chunks: Vec<Result<bytes::Bytes, std::io::Error>>) -> Vec<serde_json::Value> {
    json_document_stream(futures_util::stream::iter(chunks))
        .map(|d| d.expect("document"))
        .collect()
        .await
}

fn first_text(doc: &serde_json::Value) -> &str {
    doc["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default()
}

#[tokio::test]
async fn fixture_splits_into_two_documents_at_any_fixed_chunk_size() {
    let raw = load_fixture(FIXTURE);
    for size in [1, 2, 3, 7, 64, raw.len()] {
        let docs = documents(rechunk(raw.as_bytes(), &[size])).await;
        assert_eq!(docs.len(), 2, "chunk size {size}");
        assert_eq!(first_text(&docs[0]), "The answer {is} ");
        assert_eq!(first_text(&docs[1]), "\"42\" \\ done");
    }
}

#[tokio::test]
async fn truncated_tail_is_dropped_without_error() {
    let raw = load_fixture(FIXTURE);
    let cut = raw.rfind("\"finishReason\"").expect("marker");
    let items: Vec<_> = json_document_stream(futures_util::stream::iter(rechunk(
        &raw.as_bytes()[..cut],
        &[5],
    )))
    .collect()
    .await;
    assert_eq!(items.len(), 1);
    assert!(items[0].is_ok());
}

proptest! {
    #[test]
    fn arbitrary_chunk_boundaries_preserve_documents(
        sizes in proptest::collection::vec(1usize..40, 1..12)
    ) {
        let raw = load_fixture(FIXTURE);
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let docs = runtime.block_on(documents(rechunk(raw.as_bytes(), &sizes)));
        let expected: serde_json::Value = serde_json::from_str(&raw).unwrap();
        prop_assert_eq!(serde_json::Value::Array(docs), expected);
    }
}

#[tokio::test]
async fn gemini_client_streams_fixture() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/models/gemini-1.5-flash:streamGenerateContent")
        .match_query(mockito::Matcher::UrlEncoded("key".into(), "g-key".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(load_fixture(FIXTURE))
        .create_async()
        .await;

    let client = GeminiBuilder::new()
        .api_key("g-key")
        .base_url(server.url())
        .build()
        .unwrap();
    let events: Vec<_> = client
        .chat_stream(ChatRequest::new(vec![ChatMessage::user("question")]))
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(content_of(&events), "The answer {is} \"42\" \\ done");
    let usage = events.iter().rev().find_map(|e| match e {
        Ok(ChatStreamEvent::UsageUpdate { usage }) => Some(*usage),
        _ => None,
    });
    assert_eq!(usage.map(|u| u.total_tokens), Some(15));
    assert!(matches!(
        events.last(),
        Some(Ok(ChatStreamEvent::StreamEnd {
            finish_reason: Some(FinishReason::Stop),
            ..
        }))
    ));
}
