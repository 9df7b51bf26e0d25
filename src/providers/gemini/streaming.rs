//! Streamed `generateContent` documents to chat events.

use serde_json::Value;

use super::client::PROVIDER;
use super::transformers::{
    GenerateContentResponse, check_response, map_finish_reason, new_call_id,
};
use crate::error::LlmError;
use crate::streaming::ChatEventConverter;
use crate::types::{ChatStreamEvent, FinishReason, ResponseMetadata};

pub(super) struct GeminiEventConverter {
    metadata: ResponseMetadata,
    started: bool,
    finish_reason: Option<FinishReason>,
    tool_calls: usize,
}

impl GeminiEventConverter {
    pub(super) fn new() -> Self {
        Self {
            metadata: ResponseMetadata::new(PROVIDER),
            started: false,
            finish_reason: None,
            tool_calls: 0,
        }
    }
}

impl ChatEventConverter for GeminiEventConverter {
    fn convert(&mut self, document: Value) -> Result<Vec<ChatStreamEvent>, LlmError> {
        let parsed: GenerateContentResponse = serde_json::from_value(document.clone())
            .map_err(|e| LlmError::response_format(PROVIDER, e, document.to_string()))?;
        check_response(&document, &parsed)?;

        let mut events = Vec::new();
        if !self.started {
            self.started = true;
            self.metadata.id = parsed.response_id.clone();
            self.metadata.model = parsed.model_version.clone();
            events.push(ChatStreamEvent::StreamStart {
                metadata: self.metadata.clone(),
            });
        }

        for candidate in parsed.candidates {
            for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
                if let Some(text) = part.text.filter(|t| !t.is_empty()) {
                    events.push(ChatStreamEvent::content(text));
                }
                if let Some(call) = part.function_call {
                    events.push(ChatStreamEvent::ToolCallDelta {
                        index: self.tool_calls,
                        id: Some(new_call_id()),
                        name: Some(call.name),
                        arguments_delta: Some(call.args.to_string()),
                    });
                    self.tool_calls += 1;
                }
            }
            if let Some(reason) = candidate.finish_reason {
                self.finish_reason = Some(map_finish_reason(&reason));
                self.metadata.raw_finish_reason = Some(reason);
            }
        }

        if let Some(usage) = parsed.usage_metadata {
            events.push(ChatStreamEvent::UsageUpdate {
                usage: usage.to_usage(),
            });
        }
        Ok(events)
    }

    fn finish(&mut self) -> Vec<ChatStreamEvent> {
        let finish_reason = if self.tool_calls > 0 {
            Some(FinishReason::ToolCalls)
        } else {
            self.finish_reason.take()
        };
        vec![ChatStreamEvent::StreamEnd {
            finish_reason,
            metadata: self.metadata.clone(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn safety_mid_stream_errors() {
        let mut conv = GeminiEventConverter::new();
        conv.convert(json!({"candidates":[{"content":{"parts":[{"text":"partial"}]}}]}))
            .unwrap();
        let err = conv
            .convert(json!({"candidates":[{"finishReason":"SAFETY"}]}))
            .unwrap_err();
        assert!(matches!(err, LlmError::ProviderError { .. }));
    }

    #[test]
    fn error_object_in_stream() {
        let mut conv = GeminiEventConverter::new();
        let err = conv
            .convert(json!({"error":{"code":429,"message":"quota","status":"RESOURCE_EXHAUSTED"}}))
            .unwrap_err();
        match err {
            LlmError::ProviderError { error_code, .. } => {
                assert_eq!(error_code.as_deref(), Some("RESOURCE_EXHAUSTED"))
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn function_calls_are_indexed() {
        let mut conv = GeminiEventConverter::new();
        let events = conv
            .convert(json!({"candidates":[{"content":{"parts":[
                {"functionCall":{"name":"a","args":{}}},
                {"functionCall":{"name":"b","args":{"x":1}}}]},"finishReason":"STOP"}]}))
            .unwrap();
        assert!(matches!(&events[2], ChatStreamEvent::ToolCallDelta { index: 1, name: Some(n), .. } if n == "b"));
        assert!(matches!(
            conv.finish().as_slice(),
            [ChatStreamEvent::StreamEnd { finish_reason: Some(FinishReason::ToolCalls), .. }]
        ));
    }
}
