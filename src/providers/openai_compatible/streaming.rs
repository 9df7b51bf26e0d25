//! Chat completion chunks to stream events.

use serde::Deserialize;

use crate::error::LlmError;
use crate::providers::common::content_filtered;
use crate::streaming::ChatEventConverter;
use crate::types::{ChatStreamEvent, FinishReason, ResponseMetadata, Usage};

#[derive(Debug, Deserialize)]
struct ChatChunk {
    id: Option<String>,
    model: Option<String>,
    created: Option<i64>,
    system_fingerprint: Option<String>,
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ChunkToolCall>,
}

#[derive(Debug, Deserialize)]
struct ChunkToolCall {
    #[serde(default)]
    index: usize,
    id: Option<String>,
    #[serde(default)]
    function: ChunkFunction,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkFunction {
    name: Option<String>,
    arguments: Option<String>,
}

pub(super) struct OpenAiEventConverter {
    metadata: ResponseMetadata,
    started: bool,
    finish_reason: Option<FinishReason>,
}

impl OpenAiEventConverter {
    pub(super) fn new(provider: &str) -> Self {
        Self {
            metadata: ResponseMetadata::new(provider),
            started: false,
            finish_reason: None,
        }
    }
}

impl ChatEventConverter for OpenAiEventConverter {
    fn convert(&mut self, document: serde_json::Value) -> Result<Vec<ChatStreamEvent>, LlmError> {
        let provider = self.metadata.provider.clone();
        if let Some(error) = document.get("error") {
            let message = error["message"].as_str().unwrap_or("stream error").to_string();
            let code = error["code"].as_str().map(str::to_string);
            return Err(LlmError::provider(provider, message, code, Some(document.to_string())));
        }
        let chunk: ChatChunk = serde_json::from_value(document.clone())
            .map_err(|e| LlmError::response_format(provider.as_str(), e, document.to_string()))?;

        let mut events = Vec::new();
        if !self.started {
            self.started = true;
            self.metadata.id = chunk.id;
            self.metadata.model = chunk.model;
            self.metadata.created = chunk.created.and_then(|s| chrono::DateTime::from_timestamp(s, 0));
            self.metadata.system_fingerprint = chunk.system_fingerprint;
            events.push(ChatStreamEvent::StreamStart {
                metadata: self.metadata.clone(),
            });
        }

        for choice in chunk.choices {
            if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                events.push(ChatStreamEvent::content(content));
            }
            for call in choice.delta.tool_calls {
                events.push(ChatStreamEvent::ToolCallDelta {
                    index: call.index,
                    id: call.id,
                    name: call.function.name,
                    arguments_delta: call.function.arguments,
                });
            }
            if let Some(reason) = choice.finish_reason {
                if reason == "content_filter" {
                    return Err(content_filtered(&provider, &reason, document.to_string()));
                }
                self.finish_reason = Some(FinishReason::from_openai_style(&reason));
                self.metadata.raw_finish_reason = Some(reason);
            }
        }

        if let Some(usage) = chunk.usage {
            events.push(ChatStreamEvent::UsageUpdate { usage });
        }
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
    fn first_chunk_starts_stream() {
        let mut conv = OpenAiEventConverter::new("openai");
        let events = conv
            .convert(json!({"id":"c1","model":"gpt-4o","choices":[{"delta":{"role":"assistant","content":"Hi"}}]}))
            .unwrap();
        assert!(matches!(&events[0], ChatStreamEvent::StreamStart { metadata } if metadata.id.as_deref() == Some("c1")));
        assert_eq!(events[1].as_content_delta(), Some("Hi"));
    }

    #[test]
    fn tool_call_fragments_and_finish() {
        let mut conv = OpenAiEventConverter::new("openai");
        conv.convert(json!({"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_1","function":{"name":"f","arguments":""}}]}}]}))
            .unwrap();
        let events = conv
            .convert(json!({"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"a\":1}"}}]},"finish_reason":"tool_calls"}]}))
            .unwrap();
        match &events[0] {
            ChatStreamEvent::ToolCallDelta { id, arguments_delta, .. } => {
                assert!(id.is_none());
                assert_eq!(arguments_delta.as_deref(), Some("{\"a\":1}"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        match conv.finish().pop().unwrap() {
            ChatStreamEvent::StreamEnd { finish_reason, .. } => {
                assert_eq!(finish_reason, Some(FinishReason::ToolCalls))
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn usage_only_chunk() {
        let mut conv = OpenAiEventConverter::new("openai");
        let events = conv
            .convert(json!({"choices":[],"usage":{"prompt_tokens":3,"completion_tokens":2,"total_tokens":5}}))
            .unwrap();
        assert!(matches!(events.last(), Some(ChatStreamEvent::UsageUpdate { usage }) if usage.total_tokens == 5));
    }

    #[test]
    fn content_filter_mid_stream_errors() {
        let mut conv = OpenAiEventConverter::new("azure");
        let err = conv
            .convert(json!({"choices":[{"delta":{},"finish_reason":"content_filter"}]}))
            .unwrap_err();
        assert!(matches!(err, LlmError::ProviderError { .. }));
    }
}
