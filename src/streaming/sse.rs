//! SSE reader for vendors that send one JSON object per `data:` payload.

use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};

use super::JsonValueStream;
use crate::error::LlmError;

const DONE_MARKER: &str = "[DONE]";

/// Parse SSE `data:` payloads as JSON. Empty payloads and `[DONE]` are
/// skipped; `label` names the vendor in error messages.
pub fn sse_json_stream<S, B, E>(byte_stream: S, label: impl Into<String>) -> JsonValueStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let label = label.into();
    let out = async_stream::stream! {
        let mut events = Box::pin(byte_stream.eventsource());

        while let Some(item) = events.next().await {
            let event = match item {
                Ok(ev) => ev,
                Err(e) => {
                    yield Err(LlmError::StreamError(format!("SSE stream error ({label}): {e}")));
                    return;
                }
            };

            let data = event.data.trim();
            if data.is_empty() || data == DONE_MARKER {
                continue;
            }

            match serde_json::from_str::<serde_json::Value>(data) {
                Ok(payload) => yield Ok(payload),
                Err(e) => {
                    yield Err(LlmError::ParseError(format!(
                        "Failed to parse SSE JSON ({label}): {e}"
                    )));
                    return;
                }
            }
        }
    };
    Box::pin(out)
}
