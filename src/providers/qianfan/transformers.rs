//! ERNIE request/response mapping and stream conversion.

use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::client::PROVIDER;
use crate::error::LlmError;
use crate::history::{SystemMessagePolicy, validate_history};
use crate::http::decode_json;
use crate::providers::common::{
    content_filtered, insert_opt, merge_extensions, resolve_finish, tool_name_for_result,
};
use crate::settings::ToolCallBehavior;
use crate::streaming::ChatEventConverter;
use crate::types::{
    ChatMessage, ChatRequest, ChatResponse, ChatStreamEvent, FinishReason, MessageRole,
    ResponseMetadata, ToolCall, Usage,
};

/// `Access token invalid or no longer valid` / `Access token expired`.
const TOKEN_ERROR_CODES: [i64; 2] = [110, 111];

fn message_json(history: &[ChatMessage], message: &ChatMessage) -> Result<Value, LlmError> {
    let value = match message.role {
        MessageRole::Tool => json!({
            "role": "function",
            "name": tool_name_for_result(history, message),
            "content": message.content,
        }),
        // ERNIE carries at most one call per assistant turn.
        MessageRole::Assistant if message.tool_calls.len() > 1 => {
            return Err(LlmError::InvalidInput(format!(
                "QianFan accepts one function call per assistant message, got {}",
                message.tool_calls.len()
            )));
        }
        MessageRole::Assistant if message.has_tool_calls() => {
            let call = &message.tool_calls[0];
            json!({
                "role": "assistant",
                "content": message.content,
                "function_call": { "name": call.name, "arguments": call.arguments },
            })
        }
        role => json!({ "role": role.as_str(), "content": message.content }),
    };
    Ok(value)
}

pub(super) fn build_chat_body(request: &ChatRequest, stream: bool) -> Result<Value, LlmError> {
    let history = validate_history(&request.messages, SystemMessagePolicy::Separate)?;
    let settings = &request.settings;

    let mut body = Map::new();
    let messages = history
        .messages
        .iter()
        .map(|m| message_json(&history.messages, m))
        .collect::<Result<Vec<_>, _>>()?;
    body.insert("messages".into(), Value::Array(messages));
    insert_opt(&mut body, "system", history.system);
    insert_opt(&mut body, "temperature", settings.temperature());
    insert_opt(&mut body, "top_p", settings.top_p());
    insert_opt(&mut body, "max_output_tokens", settings.max_tokens());
    insert_opt(&mut body, "user_id", settings.user());
    if !settings.stop_sequences().is_empty() {
        body.insert("stop".into(), json!(settings.stop_sequences()));
    }

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
        body.insert("functions".into(), Value::Array(functions));
        if let ToolCallBehavior::Required { function } = settings.tool_call_behavior() {
            body.insert(
                "tool_choice".into(),
                json!({ "type": "function", "function": { "name": function } }),
            );
        }
    }
    if stream {
        body.insert("stream".into(), json!(true));
    }
    merge_extensions(&mut body, settings);
    Ok(Value::Object(body))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErnieResponse {
    id: Option<String>,
    created: Option<i64>,
    result: Option<String>,
    is_end: Option<bool>,
    need_clear_history: Option<bool>,
    finish_reason: Option<String>,
    function_call: Option<ErnieFunctionCall>,
    usage: Option<ErnieUsage>,
    search_info: Option<Value>,
    error_code: Option<i64>,
    error_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErnieFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ErnieUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

impl ErnieUsage {
    fn to_usage(&self) -> Usage {
        Usage::from_counts(self.prompt_tokens, self.completion_tokens, self.total_tokens)
    }
}

/// True when the body reports an invalid or expired access token.
pub(super) fn is_token_error(body: &str) -> bool {
    serde_json::from_str::<ErnieResponse>(body)
        .ok()
        .and_then(|r| r.error_code)
        .is_some_and(|code| TOKEN_ERROR_CODES.contains(&code))
}

fn map_finish_reason(reason: Option<&str>) -> Option<FinishReason> {
    match reason {
        None | Some("") => None,
        Some("normal") => Some(FinishReason::Stop),
        Some(r) => Some(FinishReason::from_openai_style(r)),
    }
}

/// Vendor error codes, moderation and `content_filter` finishes become errors.
fn check_response(response: &ErnieResponse, raw: &str) -> Result<(), LlmError> {
    if let Some(code) = response.error_code.filter(|c| *c != 0) {
        tracing::warn!(provider = PROVIDER, code, "vendor error");
        return Err(LlmError::provider(
            PROVIDER,
            response.error_msg.clone().unwrap_or_default(),
            Some(code.to_string()),
            Some(raw.to_string()),
        ));
    }
    if response.need_clear_history == Some(true) {
        return Err(content_filtered(PROVIDER, "need_clear_history", raw.to_string()));
    }
    if response.finish_reason.as_deref() == Some("content_filter") {
        return Err(content_filtered(PROVIDER, "content_filter", raw.to_string()));
    }
    Ok(())
}

fn new_call_id() -> String {
    format!("call_{}", uuid::Uuid::new_v4().simple())
}

fn metadata_for(response: &ErnieResponse) -> ResponseMetadata {
    let mut metadata = ResponseMetadata::new(PROVIDER)
        .with_id(response.id.clone())
        .with_created_unix(response.created);
    metadata.raw_finish_reason = response.finish_reason.clone();
    metadata.search_info = response.search_info.clone();
    metadata
}

pub(super) fn parse_chat_response(body: &str) -> Result<ChatResponse, LlmError> {
    let response: ErnieResponse = decode_json(PROVIDER, body)?;
    check_response(&response, body)?;

    let metadata = metadata_for(&response);
    let tool_calls: Vec<ToolCall> = response
        .function_call
        .into_iter()
        .map(|f| ToolCall::new(new_call_id(), f.name, f.arguments))
        .collect();
    Ok(ChatResponse {
        content: response.result.unwrap_or_default(),
        finish_reason: resolve_finish(
            map_finish_reason(response.finish_reason.as_deref()),
            !tool_calls.is_empty(),
        ),
        tool_calls,
        usage: response.usage.map(|u| u.to_usage()).unwrap_or_default(),
        metadata,
    })
}

pub(super) struct QianFanEventConverter {
    metadata: Option<ResponseMetadata>,
    finish_reason: Option<FinishReason>,
    saw_tool_call: bool,
    usage: Option<Usage>,
}

impl QianFanEventConverter {
    pub(super) fn new() -> Self {
        Self {
            metadata: None,
            finish_reason: None,
            saw_tool_call: false,
            usage: None,
        }
    }
}

impl ChatEventConverter for QianFanEventConverter {
    fn convert(&mut self, document: Value) -> Result<Vec<ChatStreamEvent>, LlmError> {
        let raw = document.to_string();
        let chunk: ErnieResponse = serde_json::from_value(document)
            .map_err(|e| LlmError::response_format(PROVIDER, e, raw.as_str()))?;
        check_response(&chunk, &raw)?;

        let mut events = Vec::new();
        if self.metadata.is_none() {
            let metadata = metadata_for(&chunk);
            events.push(ChatStreamEvent::StreamStart {
                metadata: metadata.clone(),
            });
            self.metadata = Some(metadata);
        }
        if let Some(content) = chunk.result.filter(|c| !c.is_empty()) {
            events.push(ChatStreamEvent::content(content));
        }
        if let Some(call) = chunk.function_call {
            self.saw_tool_call = true;
            events.push(ChatStreamEvent::ToolCallDelta {
                index: 0,
                id: Some(new_call_id()),
                name: Some(call.name),
                arguments_delta: Some(call.arguments),
            });
        }
        if let Some(usage) = chunk.usage {
            self.usage = Some(usage.to_usage());
        }
        if chunk.is_end == Some(true) {
            self.finish_reason = map_finish_reason(chunk.finish_reason.as_deref())
                .or(Some(FinishReason::Stop));
            if let Some(metadata) = self.metadata.as_mut() {
                metadata.raw_finish_reason = chunk.finish_reason;
            }
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
