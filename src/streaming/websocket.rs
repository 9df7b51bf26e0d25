//! WebSocket frame reader.

use futures::{Stream, StreamExt};
use tokio_tungstenite::tungstenite::{self, Message};

use super::JsonValueStream;
use crate::error::LlmError;

/// How a decoded frame affects the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Emit the frame and keep reading.
    Continue,
    /// Emit the frame and stop; the vendor marked it as the last one.
    Final,
    /// The vendor reported an error; nothing further is read.
    Error { code: String, message: String },
}

/// Read text frames as JSON documents until `classify` reports a final
/// frame or an error, or the peer closes the socket.
///
/// The socket is dropped as soon as the returned stream finishes or is
/// dropped, which closes the connection.
pub fn websocket_json_stream<S, F>(socket: S, label: impl Into<String>, classify: F) -> JsonValueStream
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Send + 'static,
    F: Fn(&serde_json::Value) -> FrameOutcome + Send + 'static,
{
    let label = label.into();
    let out = async_stream::stream! {
        let mut socket = Box::pin(socket);

        while let Some(frame) = socket.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text.as_str().to_owned(),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => text,
                    Err(e) => {
                        yield Err(LlmError::ParseError(format!("{label} sent a non-UTF-8 frame: {e}")));
                        return;
                    }
                },
                Ok(Message::Close(_)) => {
                    tracing::debug!(provider = %label, "websocket closed by peer");
                    return;
                }
                Ok(_) => continue,
                Err(e) => {
                    yield Err(LlmError::from(e));
                    return;
                }
            };

            let value: serde_json::Value = match serde_json::from_str(&text) {
                Ok(v) => v,
                Err(e) => {
                    yield Err(LlmError::response_format(label.as_str(), e, text));
                    return;
                }
            };

            match classify(&value) {
                FrameOutcome::Continue => yield Ok(value),
                FrameOutcome::Final => {
                    yield Ok(value);
                    return;
                }
                FrameOutcome::Error { code, message } => {
                    tracing::warn!(provider = %label, %code, "vendor error frame");
                    yield Err(LlmError::provider(label.as_str(), message, Some(code), Some(text)));
                    return;
                }
            }
        }
    };
    Box::pin(out)
}
