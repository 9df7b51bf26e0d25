//! Messages API stream events.

use serde::Deserialize;
use serde_json::Value;

use super::client::PROVIDER;
use super::transformers::{AnthropicUsage, map_stop_reason};
use crate::error::LlmError;
use crate::streaming::ChatEventConverter;
use crate::types::{ChatStreamEvent, FinishReason, ResponseMetadata};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    MessageStart {
        message: StartMessage,
    },
    ContentBlockStart {
        index: usize,
        content_block: Value,
    },
    ContentBlockDelta {
        index: usize,
        delta: BlockDelta,
    },
    MessageDelta {
        delta: MessageDelta,
        usage: Option<AnthropicUsage>,
    },
    Error {
        error: StreamErrorBody,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct StartMessage {
    id: Option<String>,
    model: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageDelta {
    stop_reason: Option<String>,
    stop_sequence: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamErrorBody {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
}

pub(super) struct AnthropicEventConverter {
    metadata: ResponseMetadata,
    finish_reason: Option<FinishReason>,
}

impl AnthropicEventConverter {
    pub(super) fn new() -> Self {
        Self {
            metadata: ResponseMetadata::new(PROVIDER),
            finish_reason: None,
        }
    }
}

impl ChatEventConverter for AnthropicEventConverter {
    fn convert(&mut self, document: Value) -> Result<Vec<ChatStreamEvent>, LlmError> {
        let event: StreamEvent = serde_json::from_value(document.clone())
            .map_err(|e| LlmError::response_format(PROVIDER, e, document.to_string()))?;

        let events = match event {
            StreamEvent::MessageStart { message } => {
                self.metadata.id = message.id;
                self.metadata.model = message.model;
                let mut events = vec![ChatStreamEvent::StreamStart {
                    metadata: self.metadata.clone(),
                }];
                if let Some(usage) = message.usage {
                    events.push(ChatStreamEvent::UsageUpdate {
                        usage: usage.to_usage(),
                    });
                }
                events
            }
            StreamEvent::ContentBlockStart {
                index,
                content_block,
            } if content_block["type"] == "tool_use" => vec![ChatStreamEvent::ToolCallDelta {
                index,
                id: content_block["id"].as_str().map(str::to_string),
                name: content_block["name"].as_str().map(str::to_string),
                arguments_delta: None,
            }],
            StreamEvent::ContentBlockDelta { index, delta } => match delta {
                BlockDelta::TextDelta { text } => vec![ChatStreamEvent::content(text)],
                BlockDelta::InputJsonDelta { partial_json } => {
                    vec![ChatStreamEvent::ToolCallDelta {
                        index,
                        id: None,
                        name: None,
                        arguments_delta: Some(partial_json),
                    }]
                }
                BlockDelta::Other => Vec::new(),
            },
            StreamEvent::MessageDelta { delta, usage } => {
                if let Some(reason) = delta.stop_reason {
                    self.finish_reason = Some(map_stop_reason(&reason));
                    self.metadata.raw_finish_reason = Some(reason);
                }
                self.metadata.stop_sequence = delta.stop_sequence;
                usage
                    .map(|u| vec![ChatStreamEvent::UsageUpdate { usage: u.to_usage() }])
                    .unwrap_or_default()
            }
            StreamEvent::Error { error } => {
                tracing::warn!(provider = PROVIDER, kind = ?error.kind, "stream error event");
                return Err(LlmError::provider(
                    PROVIDER,
                    error.message.unwrap_or_else(|| "stream error".to_string()),
                    error.kind,
                    Some(document.to_string()),
                ));
            }
            _ => Vec::new(),
        };
        Ok(events)
    }

    fn finish(&mut self) -> Vec<ChatStreamEvent> {
        vec![ChatStreamEvent::StreamEnd {
            finish_reason: self.finish_reason.take(),
            metadata: self.metadata.clone(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_use_block_streams_id_then_arguments() {
        let mut conv = AnthropicEventConverter::new();
        let start = conv
            .convert(json!({"type":"content_block_start","index":1,"content_block":{"type":"tool_use","id":"tu_1","name":"f","input":{}}}))
            .unwrap();
        assert!(matches!(&start[0], ChatStreamEvent::ToolCallDelta { index: 1, id: Some(id), .. } if id == "tu_1"));

        let delta = conv
            .convert(json!({"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":"{\"a\":"}}))
            .unwrap();
        assert!(matches!(&delta[0], ChatStreamEvent::ToolCallDelta { arguments_delta: Some(p), .. } if p == "{\"a\":"));
    }

    #[test]
    fn text_block_start_emits_nothing() {
        let mut conv = AnthropicEventConverter::new();
        let events = conv
            .convert(json!({"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}))
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn error_event_fails_stream() {
        let mut conv = AnthropicEventConverter::new();
        let err = conv
            .convert(json!({"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}))
            .unwrap_err();
        match err {
            LlmError::ProviderError { error_code, message, .. } => {
                assert_eq!(error_code.as_deref(), Some("overloaded_error"));
                assert_eq!(message, "Overloaded");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
