//! Stream processor
//!
//! Folds [`ChatStreamEvent`]s back into a [`ChatResponse`]: content deltas are
//! concatenated, tool call fragments are joined per index and the last usage
//! report wins.

use futures::StreamExt;
use std::collections::BTreeMap;

use crate::error::LlmError;
use crate::types::{
    ChatResponse, ChatStream, ChatStreamEvent, FinishReason, ResponseMetadata, ToolCall, Usage,
};

#[derive(Debug, Default)]
struct ToolCallBuilder {
    id: String,
    name: String,
    arguments: String,
}

/// Accumulates stream events into a complete response.
#[derive(Debug, Default)]
pub struct StreamProcessor {
    content: String,
    tool_calls: BTreeMap<usize, ToolCallBuilder>,
    usage: Option<Usage>,
    finish_reason: Option<FinishReason>,
    metadata: Option<ResponseMetadata>,
}

impl StreamProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_event(&mut self, event: ChatStreamEvent) {
        match event {
            ChatStreamEvent::StreamStart { metadata } => self.metadata = Some(metadata),
            ChatStreamEvent::ContentDelta { delta } => self.content.push_str(&delta),
            ChatStreamEvent::ToolCallDelta {
                index,
                id,
                name,
                arguments_delta,
            } => {
                let call = self.tool_calls.entry(index).or_default();
                if let Some(id) = id.filter(|id| !id.is_empty()) {
                    call.id = id;
                }
                if let Some(name) = name.filter(|n| !n.is_empty()) {
                    call.name = name;
                }
                if let Some(arguments) = arguments_delta {
                    call.arguments.push_str(&arguments);
                }
            }
            ChatStreamEvent::UsageUpdate { usage } => self.usage = Some(usage),
            ChatStreamEvent::StreamEnd {
                finish_reason,
                metadata,
            } => {
                self.finish_reason = finish_reason;
                self.metadata = Some(metadata);
            }
        }
    }

    /// Content accumulated so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_response(self) -> ChatResponse {
        ChatResponse {
            content: self.content,
            tool_calls: self
                .tool_calls
                .into_values()
                .map(|c| ToolCall::new(c.id, c.name, c.arguments))
                .collect(),
            finish_reason: self.finish_reason,
            usage: self.usage.unwrap_or_default(),
            metadata: self.metadata.unwrap_or_default(),
        }
    }
}

/// Drain `stream` into a single response, failing on the first error.
pub async fn collect_chat_response(mut stream: ChatStream) -> Result<ChatResponse, LlmError> {
    let mut processor = StreamProcessor::new();
    while let Some(event) = stream.next().await {
        processor.process_event(event?);
    }
    Ok(processor.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(index: usize, id: Option<&str>, name: Option<&str>, args: &str) -> ChatStreamEvent {
        ChatStreamEvent::ToolCallDelta {
            index,
            id: id.map(str::to_string),
            name: name.map(str::to_string),
            arguments_delta: Some(args.to_string()),
        }
    }

    #[tokio::test]
    async fn joins_content_and_tool_fragments() {
        let events = vec![
            Ok(ChatStreamEvent::StreamStart {
                metadata: ResponseMetadata::new("test"),
            }),
            Ok(ChatStreamEvent::content("Hel")),
            Ok(ChatStreamEvent::content("lo")),
            Ok(delta(1, Some("b"), Some("second"), "{}")),
            Ok(delta(0, Some("a"), Some("first"), "{\"x\":")),
            Ok(delta(0, None, None, "1}")),
            Ok(ChatStreamEvent::UsageUpdate {
                usage: Usage::from_counts(Some(3), Some(4), None),
            }),
            Ok(ChatStreamEvent::StreamEnd {
                finish_reason: Some(FinishReason::ToolCalls),
                metadata: ResponseMetadata::new("test"),
            }),
        ];
        let stream: ChatStream = Box::pin(futures::stream::iter(events));
        let response = collect_chat_response(stream).await.unwrap();
        assert_eq!(response.content, "Hello");
        assert_eq!(response.tool_calls.len(), 2);
        assert_eq!(response.tool_calls[0].name, "first");
        assert_eq!(response.tool_calls[0].arguments, "{\"x\":1}");
        assert_eq!(response.usage.total_tokens, 7);
        assert_eq!(response.finish_reason, Some(FinishReason::ToolCalls));
    }

    #[tokio::test]
    async fn first_error_is_returned() {
        let events = vec![
            Ok(ChatStreamEvent::content("partial")),
            Err(LlmError::StreamError("reset".into())),
        ];
        let stream: ChatStream = Box::pin(futures::stream::iter(events));
        assert!(matches!(
            collect_chat_response(stream).await,
            Err(LlmError::StreamError(_))
        ));
    }
}
