//! Request-building helpers shared by several connectors.

#![allow(dead_code)]

use serde_json::{Map, Value, json};

use crate::error::LlmError;
use crate::settings::ExecutionSettings;
use crate::types::{ChatMessage, FinishReason, Tool, ToolCall, TranslationRequest};

/// `{"role", "content", ...}` in the OpenAI chat format, used as-is by
/// DashScope and DouBao.
pub(crate) fn openai_message_json(message: &ChatMessage) -> Value {
    let mut obj = Map::new();
    obj.insert("role".into(), json!(message.role.as_str()));
    if message.has_tool_calls() && message.content.is_empty() {
        obj.insert("content".into(), Value::Null);
    } else {
        obj.insert("content".into(), json!(message.content));
    }
    if let Some(name) = &message.name {
        obj.insert("name".into(), json!(name));
    }
    if message.has_tool_calls() {
        obj.insert(
            "tool_calls".into(),
            Value::Array(message.tool_calls.iter().map(openai_tool_call_json).collect()),
        );
    }
    if let Some(id) = &message.tool_call_id {
        obj.insert("tool_call_id".into(), json!(id));
    }
    Value::Object(obj)
}

pub(crate) fn openai_tool_call_json(call: &ToolCall) -> Value {
    json!({
        "id": call.id,
        "type": "function",
        "function": { "name": call.name, "arguments": call.arguments }
    })
}

pub(crate) fn openai_tools_json(tools: &[Tool]) -> Value {
    Value::Array(tools.iter().map(Tool::to_openai_json).collect())
}

/// Insert `value` under `key` when present.
pub(crate) fn insert_opt<T: serde::Serialize>(obj: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(v) = value {
        obj.insert(key.to_string(), json!(v));
    }
}

/// Copy the settings' vendor-specific extensions into `obj`, overriding
/// mapped fields of the same name.
pub(crate) fn merge_extensions(obj: &mut Map<String, Value>, settings: &ExecutionSettings) {
    for (key, value) in settings.extensions() {
        obj.insert(key.clone(), value.clone());
    }
}

/// Name of the function a tool result answers, looked up from the assistant
/// turn that requested it. Vendors without call ids need it.
pub(crate) fn tool_name_for_result(history: &[ChatMessage], message: &ChatMessage) -> String {
    if let Some(name) = &message.name {
        return name.clone();
    }
    let id = message.tool_call_id.as_deref().unwrap_or_default();
    history
        .iter()
        .flat_map(|m| m.tool_calls.iter())
        .find(|c| c.id == id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| id.to_string())
}

/// Reject translation requests with nothing to translate or no target.
pub(crate) fn validate_translation(request: &TranslationRequest) -> Result<(), LlmError> {
    if request.texts.is_empty() || request.texts.iter().all(|t| t.trim().is_empty()) {
        return Err(LlmError::InvalidInput(
            "translation request must contain at least one non-empty text".to_string(),
        ));
    }
    if request.target.trim().is_empty() {
        return Err(LlmError::InvalidInput(
            "translation target language must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Error for a response the vendor refused to produce.
pub(crate) fn content_filtered(provider: &str, code: &str, raw_body: String) -> LlmError {
    tracing::warn!(provider, code, "response blocked by content filter");
    LlmError::provider(
        provider,
        "response blocked by the vendor content filter",
        Some(code.to_string()),
        Some(raw_body),
    )
}

/// Finish reason for a completed response: tool calls win over the
/// vendor's stop reason.
pub(crate) fn resolve_finish(reason: Option<FinishReason>, has_tool_calls: bool) -> Option<FinishReason> {
    if has_tool_calls {
        Some(FinishReason::ToolCalls)
    } else {
        reason
    }
}
