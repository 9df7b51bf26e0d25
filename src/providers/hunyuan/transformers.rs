//! HunYuan request/response DTOs and stream conversion.

use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::client::PROVIDER;
use crate::error::LlmError;
use crate::history::{SystemMessagePolicy, validate_history};
use crate::http::decode_json;
use crate::providers::common::{content_filtered, insert_opt, merge_extensions, resolve_finish};
use crate::settings::ToolCallBehavior;
use crate::streaming::ChatEventConverter;
use crate::types::{
    ChatMessage, ChatRequest, ChatResponse, ChatStreamEvent, FinishReason, ResponseMetadata,
    ToolCall, Usage,
};

/// HunYuan's moderation finish reason.
const SENSITIVE: &str = "sensitive";

fn message_json(message: &ChatMessage) -> Value {
    let mut obj = Map::new();
    obj.insert("Role".into(), json!(message.role.as_str()));
    obj.insert("Content".into(), json!(message.content));
    if message.has_tool_calls() {
        let calls: Vec<Value> = message
            .tool_calls
            .iter()
            .map(|c| {
                json!({
                    "Id": c.id,
                    "Type": "function",
                    "Function": { "Name": c.name, "Arguments": c.arguments }
                })
            })
            .collect();
        obj.insert("ToolCalls".into(), Value::Array(calls));
    }
    insert_opt(&mut obj, "ToolCallId", message.tool_call_id.as_deref());
    Value::Object(obj)
}

pub(super) fn build_chat_body(
    request: &ChatRequest,
    default_model: &str,
    stream: bool,
) -> Result<Value, LlmError> {
    let history = validate_history(&request.messages, SystemMessagePolicy::Inline)?;
    let settings = &request.settings;

    let mut body = Map::new();
    body.insert("Model".into(), json!(settings.model_or(default_model)));
    body.insert(
        "Messages".into(),
        Value::Array(history.messages.iter().map(message_json).collect()),
    );
    body.insert("Stream".into(), json!(stream));
    insert_opt(&mut body, "Temperature", settings.temperature());
    insert_opt(&mut body, "TopP", settings.top_p());
    insert_opt(&mut body, "Seed", settings.seed());
    if !settings.stop_sequences().is_empty() {
        body.insert("Stop".into(), json!(settings.stop_sequences()));
    }

    let tools = request.active_tools();
    if !tools.is_empty() {
        let tools: Vec<Value> = tools
            .iter()
            .map(|t| {
                json!({
                    "Type": "function",
                    "Function": {
                        "Name": t.name,
                        "Description": t.description,
                        // HunYuan takes the schema as a JSON string.
                        "Parameters": t.parameters.to_string(),
                    }
                })
            })
            .collect();
        body.insert("Tools".into(), Value::Array(tools));
        match settings.tool_call_behavior() {
            ToolCallBehavior::Required { function } => {
                body.insert("ToolChoice".into(), json!("custom"));
                body.insert(
                    "CustomTool".into(),
                    json!({ "Type": "function", "Function": { "Name": function } }),
                );
            }
            _ => {
                body.insert("ToolChoice".into(), json!("auto"));
            }
        }
    }
    merge_extensions(&mut body, settings);
    Ok(Value::Object(body))
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Response")]
    response: ChatCompletionsResponse,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ChatCompletionsResponse {
    id: Option<String>,
    request_id: Option<String>,
    created: Option<i64>,
    choices: Vec<Choice>,
    usage: Option<HunYuanUsage>,
    error: Option<VendorError>,
    search_info: Option<Value>,
    /// Streaming moderation error.
    error_msg: Option<StreamErrorMsg>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VendorError {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StreamErrorMsg {
    code: Option<i64>,
    msg: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Choice {
    finish_reason: Option<String>,
    message: Option<HunYuanMessage>,
    delta: Option<HunYuanMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct HunYuanMessage {
    content: Option<String>,
    tool_calls: Vec<HunYuanToolCall>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct HunYuanToolCall {
    id: Option<String>,
    index: Option<usize>,
    function: HunYuanFunction,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct HunYuanFunction {
    name: Option<String>,
    arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HunYuanUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

impl HunYuanUsage {
    fn to_usage(&self) -> Usage {
        Usage::from_counts(self.prompt_tokens, self.completion_tokens, self.total_tokens)
    }
}

fn map_finish_reason(reason: Option<&str>) -> Option<FinishReason> {
    match reason {
        None | Some("") => None,
        Some(r) => Some(FinishReason::from_openai_style(r)),
    }
}

fn check_vendor_error(response: &ChatCompletionsResponse, raw: &str) -> Result<(), LlmError> {
    if let Some(error) = &response.error {
        tracing::warn!(provider = PROVIDER, code = %error.code, "vendor error");
        return Err(LlmError::provider(
            PROVIDER,
            error.message.clone(),
            Some(error.code.clone()),
            Some(raw.to_string()),
        ));
    }
    if let Some(error) = &response.error_msg {
        return Err(LlmError::provider(
            PROVIDER,
            error.msg.clone().unwrap_or_else(|| "stream rejected".to_string()),
            error.code.map(|c| c.to_string()),
            Some(raw.to_string()),
        ));
    }
    Ok(())
}

pub(super) fn parse_chat_response(body: &str) -> Result<ChatResponse, LlmError> {
    let envelope: Envelope = decode_json(PROVIDER, body)?;
    let response = envelope.response;
    check_vendor_error(&response, body)?;

    let choice = response.choices.into_iter().next().ok_or_else(|| {
        LlmError::provider(PROVIDER, "response contained no choices", None, Some(body.to_string()))
    })?;
    if choice.finish_reason.as_deref() == Some(SENSITIVE) {
        return Err(content_filtered(PROVIDER, SENSITIVE, body.to_string()));
    }

    let message = choice.message.unwrap_or_default();
    let tool_calls: Vec<ToolCall> = message
        .tool_calls
        .into_iter()
        .map(|c| {
            ToolCall::new(
                c.id.unwrap_or_default(),
                c.function.name.unwrap_or_default(),
                c.function.arguments.unwrap_or_default(),
            )
        })
        .collect();

    let mut metadata = ResponseMetadata::new(PROVIDER)
        .with_id(response.id)
        .with_request_id(response.request_id)
        .with_created_unix(response.created);
    metadata.raw_finish_reason = choice.finish_reason.clone();
    metadata.search_info = response.search_info;

    Ok(ChatResponse {
        content: message.content.unwrap_or_default(),
        finish_reason: resolve_finish(
            map_finish_reason(choice.finish_reason.as_deref()),
            !tool_calls.is_empty(),
        ),
        tool_calls,
        usage: response.usage.map(|u| u.to_usage()).unwrap_or_default(),
        metadata,
    })
}

pub(super) struct HunYuanEventConverter {
    metadata: ResponseMetadata,
    started: bool,
    finish_reason: Option<FinishReason>,
    usage: Option<Usage>,
}

impl HunYuanEventConverter {
    pub(super) fn new() -> Self {
        Self {
            metadata: ResponseMetadata::new(PROVIDER),
            started: false,
            finish_reason: None,
            usage: None,
        }
    }
}

impl ChatEventConverter for HunYuanEventConverter {
    fn convert(&mut self, document: Value) -> Result<Vec<ChatStreamEvent>, LlmError> {
        let raw = document.to_string();
        let chunk: ChatCompletionsResponse = serde_json::from_value(document)
            .map_err(|e| LlmError::response_format(PROVIDER, e, raw.as_str()))?;
        check_vendor_error(&chunk, &raw)?;

        let mut events = Vec::new();
        if !self.started {
            self.started = true;
            self.metadata.id = chunk.id.clone();
            self.metadata.created = chunk
                .created
                .and_then(|s| chrono::DateTime::from_timestamp(s, 0));
            events.push(ChatStreamEvent::StreamStart {
                metadata: self.metadata.clone(),
            });
        }
        if chunk.search_info.is_some() {
            self.metadata.search_info = chunk.search_info;
        }

        for choice in chunk.choices {
            if choice.finish_reason.as_deref() == Some(SENSITIVE) {
                return Err(content_filtered(PROVIDER, SENSITIVE, raw));
            }
            let delta = choice.delta.unwrap_or_default();
            if let Some(content) = delta.content.filter(|c| !c.is_empty()) {
                events.push(ChatStreamEvent::content(content));
            }
            for (position, call) in delta.tool_calls.into_iter().enumerate() {
                events.push(ChatStreamEvent::ToolCallDelta {
                    index: call.index.unwrap_or(position),
                    id: call.id,
                    name: call.function.name,
                    arguments_delta: call.function.arguments,
                });
            }
            if let Some(reason) = map_finish_reason(choice.finish_reason.as_deref()) {
                self.finish_reason = Some(reason);
                self.metadata.raw_finish_reason = choice.finish_reason;
            }
        }

        // Usage is cumulative per chunk.
        if let Some(usage) = chunk.usage {
            self.usage = Some(usage.to_usage());
        }
        Ok(events)
    }

    fn finish(&mut self) -> Vec<ChatStreamEvent> {
        let mut events = Vec::new();
        if let Some(usage) = self.usage.take() {
            events.push(ChatStreamEvent::UsageUpdate { usage });
        }
        events.push(ChatStreamEvent::StreamEnd {
            finish_reason: self.finish_reason.take(),
            metadata: self.metadata.clone(),
        });
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ExecutionSettings;
    use crate::types::Tool;

    #[test]
    fn pascal_case_body_with_inline_system() {
        let settings = ExecutionSettings::builder()
            .temperature(0.5)
            .extension("EnableEnhancement", json!(false))
            .tool_call_behavior(ToolCallBehavior::EnableFunctions)
            .build()
            .unwrap();
        let request = ChatRequest::new(vec![
            ChatMessage::system("你是助手"),
            ChatMessage::user("你好"),
        ])
        .with_tools(vec![Tool::function("get_time", "Time", json!({"type":"object"}))])
        .with_settings(settings);
        let body = build_chat_body(&request, "hunyuan-pro", false).unwrap();
        assert_eq!(body["Messages"][0]["Role"], "system");
        assert_eq!(body["Stream"], false);
        assert_eq!(body["EnableEnhancement"], false);
        assert_eq!(body["Tools"][0]["Function"]["Parameters"], r#"{"type":"object"}"#);
        assert_eq!(body["ToolChoice"], "auto");
    }

    #[test]
    fn response_error_is_provider_error() {
        let body = r#"{"Response":{"Error":{"Code":"InvalidParameter","Message":"bad model"},"RequestId":"r1"}}"#;
        match parse_chat_response(body).unwrap_err() {
            LlmError::ProviderError { error_code, raw_body, .. } => {
                assert_eq!(error_code.as_deref(), Some("InvalidParameter"));
                assert_eq!(raw_body.as_deref(), Some(body));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn sensitive_finish_is_content_filter_error() {
        let body = r#"{"Response":{"Choices":[{"FinishReason":"sensitive","Message":{"Content":""}}]}}"#;
        assert!(matches!(
            parse_chat_response(body),
            Err(LlmError::ProviderError { .. })
        ));
    }

    #[test]
    fn tool_calls_in_response() {
        let body = r#"{"Response":{"Choices":[{"FinishReason":"tool_calls","Message":{"Role":"assistant","Content":"",
            "ToolCalls":[{"Id":"call_1","Type":"function","Function":{"Name":"get_time","Arguments":"{}"}}]}}]}}"#;
        let resp = parse_chat_response(body).unwrap();
        assert_eq!(resp.tool_calls[0].name, "get_time");
        assert_eq!(resp.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(resp.usage, Usage::default());
    }
}
