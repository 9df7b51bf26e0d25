//! SparkDesk frame mapping.

use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::client::PROVIDER;
use crate::error::LlmError;
use crate::history::{SystemMessagePolicy, validate_history};
use crate::providers::common::{insert_opt, merge_extensions, resolve_finish};
use crate::streaming::{ChatEventConverter, FrameOutcome};
use crate::types::{
    ChatMessage, ChatRequest, ChatStreamEvent, FinishReason, MessageRole, ResponseMetadata, Usage,
};

/// `header.status` of the last frame of an answer.
const STATUS_FINAL: i64 = 2;

/// SparkDesk has no tool role; results are replayed as a user instruction.
fn tool_result_text(content: &str) -> String {
    format!("Output this: {content}")
}

fn history_text(messages: &[ChatMessage]) -> Vec<Value> {
    messages
        .iter()
        .filter_map(|m| match m.role {
            MessageRole::Tool => Some(json!({
                "role": "user",
                "content": tool_result_text(&m.content),
            })),
            // A turn that only requested tools has nothing to replay.
            MessageRole::Assistant if m.has_tool_calls() && m.content.is_empty() => None,
            role => Some(json!({ "role": role.as_str(), "content": m.content })),
        })
        .collect()
}

pub(super) fn build_chat_frame(
    request: &ChatRequest,
    app_id: &str,
    default_domain: &str,
) -> Result<Value, LlmError> {
    let history = validate_history(&request.messages, SystemMessagePolicy::Inline)?;
    let settings = &request.settings;

    let mut chat = Map::new();
    chat.insert("domain".into(), json!(settings.model_or(default_domain)));
    insert_opt(&mut chat, "temperature", settings.temperature());
    insert_opt(&mut chat, "max_tokens", settings.max_tokens());
    insert_opt(&mut chat, "top_k", settings.top_k());
    merge_extensions(&mut chat, settings);

    let uid = settings
        .user()
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());

    let mut payload = Map::new();
    payload.insert("message".into(), json!({ "text": history_text(&history.messages) }));
    let tools = request.active_tools();
    if !tools.is_empty() {
        let functions: Vec<Value> = tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters,
                })
            })
            .collect();
        payload.insert("functions".into(), json!({ "text": functions }));
    }

    Ok(json!({
        "header": { "app_id": app_id, "uid": uid },
        "parameter": { "chat": chat },
        "payload": payload,
    }))
}

#[derive(Debug, Deserialize)]
struct Frame {
    header: FrameHeader,
    #[serde(default)]
    payload: Option<FramePayload>,
}

#[derive(Debug, Deserialize)]
struct FrameHeader {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    sid: Option<String>,
    #[serde(default)]
    status: i64,
}

#[derive(Debug, Deserialize)]
struct FramePayload {
    choices: Option<FrameChoices>,
    usage: Option<FrameUsage>,
}

#[derive(Debug, Deserialize)]
struct FrameChoices {
    #[serde(default)]
    text: Vec<FrameText>,
}

#[derive(Debug, Deserialize)]
struct FrameText {
    #[serde(default)]
    content: String,
    index: Option<usize>,
    function_call: Option<FrameFunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FrameFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct FrameUsage {
    text: Option<FrameTokenCounts>,
}

#[derive(Debug, Deserialize)]
struct FrameTokenCounts {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

/// Non-zero `header.code` is an error; `header.status == 2` ends the answer.
pub(super) fn classify_frame(frame: &Value) -> FrameOutcome {
    let header = &frame["header"];
    let code = header["code"].as_i64().unwrap_or(0);
    if code != 0 {
        return FrameOutcome::Error {
            code: code.to_string(),
            message: header["message"].as_str().unwrap_or_default().to_string(),
        };
    }
    if header["status"].as_i64() == Some(STATUS_FINAL) {
        FrameOutcome::Final
    } else {
        FrameOutcome::Continue
    }
}

pub(super) struct SparkEventConverter {
    metadata: Option<ResponseMetadata>,
    finish_reason: Option<FinishReason>,
    saw_tool_call: bool,
    usage: Option<Usage>,
}

impl SparkEventConverter {
    pub(super) fn new() -> Self {
        Self {
            metadata: None,
            finish_reason: None,
            saw_tool_call: false,
            usage: None,
        }
    }
}

impl ChatEventConverter for SparkEventConverter {
    fn convert(&mut self, document: Value) -> Result<Vec<ChatStreamEvent>, LlmError> {
        let raw = document.to_string();
        let frame: Frame = serde_json::from_value(document)
            .map_err(|e| LlmError::response_format(PROVIDER, e, raw.as_str()))?;
        if frame.header.code != 0 {
            return Err(LlmError::provider(
                PROVIDER,
                frame.header.message,
                Some(frame.header.code.to_string()),
                Some(raw),
            ));
        }

        let mut events = Vec::new();
        if self.metadata.is_none() {
            let metadata = ResponseMetadata::new(PROVIDER).with_id(frame.header.sid.clone());
            events.push(ChatStreamEvent::StreamStart {
                metadata: metadata.clone(),
            });
            self.metadata = Some(metadata);
        }

        let payload = frame.payload;
        let texts = payload
            .as_ref()
            .and_then(|p| p.choices.as_ref())
            .map(|c| c.text.as_slice())
            .unwrap_or_default();
        for (position, text) in texts.iter().enumerate() {
            if !text.content.is_empty() {
                events.push(ChatStreamEvent::content(text.content.clone()));
            }
            if let Some(call) = &text.function_call {
                self.saw_tool_call = true;
                events.push(ChatStreamEvent::ToolCallDelta {
                    index: text.index.unwrap_or(position),
                    id: Some(format!("call_{}", uuid::Uuid::new_v4().simple())),
                    name: Some(call.name.clone()),
                    arguments_delta: Some(call.arguments.clone()),
                });
            }
        }

        if let Some(counts) = payload.and_then(|p| p.usage).and_then(|u| u.text) {
            self.usage = Some(Usage::from_counts(
                counts.prompt_tokens,
                counts.completion_tokens,
                counts.total_tokens,
            ));
        }
        if frame.header.status == STATUS_FINAL {
            self.finish_reason = Some(FinishReason::Stop);
        }
        Ok(events)
    }

    fn finish(&mut self) -> Vec<ChatStreamEvent> {
        let mut events = Vec::new();
        if let Some(usage) = self.usage.take() {
            events.push(ChatStreamEvent::UsageUpdate { usage });
        }
        events.push(ChatStreamEvent::StreamEnd {
            finish_reason: resolve_finish(self.finish_reason.take(), self.saw_tool_call),
            metadata: self
                .metadata
                .take()
                .unwrap_or_else(|| ResponseMetadata::new(PROVIDER)),
        });
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ExecutionSettings, ToolCallBehavior};
    use crate::types::{Tool, ToolCall};

    #[test]
    fn tool_results_are_wrapped_as_user_turns() {
        let settings = ExecutionSettings::builder()
            .temperature(0.5)
            .top_k(4)
            .tool_call_behavior(ToolCallBehavior::EnableFunctions)
            .build()
            .unwrap();
        let request = ChatRequest::new(vec![
            ChatMessage::user("北京天气"),
            ChatMessage::assistant_tool_calls(vec![ToolCall::new("c1", "weather", "{}")]),
            ChatMessage::tool_result("c1", "晴，25度"),
        ])
        .with_tools(vec![Tool::function("weather", "Weather", json!({"type":"object"}))])
        .with_settings(settings);

        let frame = build_chat_frame(&request, "app", "generalv3.5").unwrap();
        let text = frame["payload"]["message"]["text"].as_array().unwrap();
        assert_eq!(text.len(), 2);
        assert_eq!(text[1]["role"], "user");
        assert_eq!(text[1]["content"], "Output this: 晴，25度");
        assert_eq!(frame["payload"]["functions"]["text"][0]["name"], "weather");
        assert_eq!(frame["parameter"]["chat"]["top_k"], 4);
        assert_eq!(frame["header"]["uid"].as_str().unwrap().len(), 32);
    }

    #[test]
    fn classify_follows_header() {
        assert_eq!(
            classify_frame(&json!({"header": {"code": 0, "status": 1}})),
            FrameOutcome::Continue
        );
        assert_eq!(
            classify_frame(&json!({"header": {"code": 0, "status": 2}})),
            FrameOutcome::Final
        );
        assert!(matches!(
            classify_frame(&json!({"header": {"code": 11200, "message": "no auth", "status": 2}})),
            FrameOutcome::Error { code, .. } if code == "11200"
        ));
    }

    #[test]
    fn function_call_frame_becomes_tool_call() {
        let mut converter = SparkEventConverter::new();
        let events = converter
            .convert(json!({
                "header": {"code": 0, "sid": "s", "status": 2},
                "payload": {"choices": {"text": [{
                    "content": "", "index": 0,
                    "function_call": {"name": "weather", "arguments": "{\"city\":\"北京\"}"}
                }]}}
            }))
            .unwrap();
        assert!(matches!(
            &events[1],
            ChatStreamEvent::ToolCallDelta { name: Some(n), .. } if n == "weather"
        ));
        assert!(matches!(
            converter.finish().as_slice(),
            [ChatStreamEvent::StreamEnd {
                finish_reason: Some(FinishReason::ToolCalls),
                ..
            }]
        ));
    }
}
