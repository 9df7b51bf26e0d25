//! Mapping from decoded vendor documents to chat stream events.

use futures::StreamExt;

use super::JsonValueStream;
use crate::error::LlmError;
use crate::types::{ChatStream, ChatStreamEvent};

/// Per-vendor conversion of streamed JSON documents into chat events.
///
/// One converter instance handles one stream, so it may keep state
/// (metadata seen in the first chunk, the last finish reason).
pub trait ChatEventConverter: Send + 'static {
    /// Events for one document. An error ends the stream.
    fn convert(&mut self, document: serde_json::Value) -> Result<Vec<ChatStreamEvent>, LlmError>;

    /// Trailing events once the transport is exhausted, normally ending
    /// with `StreamEnd`.
    fn finish(&mut self) -> Vec<ChatStreamEvent>;
}

/// Drive `converter` over `documents`, yielding chat events in order.
pub fn chat_event_stream<C: ChatEventConverter>(
    documents: JsonValueStream,
    mut converter: C,
) -> ChatStream {
    let out = async_stream::stream! {
        let mut documents = documents;
        while let Some(item) = documents.next().await {
            let events = match item.and_then(|doc| converter.convert(doc)) {
                Ok(events) => events,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            for event in events {
                yield Ok(event);
            }
        }
        for event in converter.finish() {
            yield Ok(event);
        }
    };
    Box::pin(out)
}
