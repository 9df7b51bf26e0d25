//! Streaming response readers.
//!
//! Vendors stream in three shapes: SSE `data:` payloads, a chunked JSON array
//! (or bare concatenated documents) and WebSocket text frames. Each reader
//! turns raw transport input into a stream of `serde_json::Value` documents;
//! connectors map those into [`ChatStreamEvent`](crate::types::ChatStreamEvent)s.

mod cancel;
mod events;
mod json_codec;
mod processor;
mod sse;
mod websocket;

use futures::Stream;
use std::pin::Pin;

use crate::error::LlmError;

pub use cancel::make_cancellable_stream;
pub use events::{ChatEventConverter, chat_event_stream};
pub use json_codec::{JsonDocumentCodec, json_document_stream};
pub use processor::{StreamProcessor, collect_chat_response};
pub use sse::sse_json_stream;
pub use websocket::{FrameOutcome, websocket_json_stream};

/// Stream of decoded JSON documents.
pub type JsonValueStream = Pin<Box<dyn Stream<Item = Result<serde_json::Value, LlmError>> + Send>>;
