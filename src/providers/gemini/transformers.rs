//! `generateContent` request and response mapping.

use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::client::PROVIDER;
use crate::error::LlmError;
use crate::history::{SystemMessagePolicy, validate_history};
use crate::http::decode_json;
use crate::providers::common::{insert_opt, merge_extensions, resolve_finish, tool_name_for_result};
use crate::settings::{ExecutionSettings, ToolCallBehavior};
use crate::types::{
    ChatMessage, ChatRequest, ChatResponse, FinishReason, MessageRole, ResponseMetadata, ToolCall,
    Usage,
};

/// Finish reasons that mean the candidate was withheld.
const BLOCKED_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

fn parts(history: &[ChatMessage], message: &ChatMessage) -> Result<Vec<Value>, LlmError> {
    if message.role == MessageRole::Tool {
        let response = serde_json::from_str::<Value>(&message.content)
            .ok()
            .filter(Value::is_object)
            .unwrap_or_else(|| json!({ "content": message.content }));
        return Ok(vec![json!({
            "functionResponse": {
                "name": tool_name_for_result(history, message),
                "response": response,
            }
        })]);
    }

    let mut parts = Vec::new();
    if !message.content.is_empty() {
        parts.push(json!({ "text": message.content }));
    }
    for call in &message.tool_calls {
        parts.push(json!({
            "functionCall": { "name": call.name, "args": call.arguments_json()? }
        }));
    }
    Ok(parts)
}

fn contents(messages: &[ChatMessage]) -> Result<Vec<Value>, LlmError> {
    messages
        .iter()
        .map(|m| {
            let role = match m.role {
                MessageRole::Assistant => "model",
                _ => "user",
            };
            Ok(json!({ "role": role, "parts": parts(messages, m)? }))
        })
        .collect()
}

fn generation_config(settings: &ExecutionSettings) -> Map<String, Value> {
    let mut config = Map::new();
    insert_opt(&mut config, "temperature", settings.temperature());
    insert_opt(&mut config, "topP", settings.top_p());
    insert_opt(&mut config, "topK", settings.top_k());
    insert_opt(&mut config, "maxOutputTokens", settings.max_tokens());
    insert_opt(&mut config, "presencePenalty", settings.presence_penalty());
    insert_opt(&mut config, "frequencyPenalty", settings.frequency_penalty());
    insert_opt(&mut config, "seed", settings.seed());
    if !settings.stop_sequences().is_empty() {
        config.insert("stopSequences".into(), json!(settings.stop_sequences()));
    }
    config
}

fn tool_config(behavior: &ToolCallBehavior) -> Option<Value> {
    match behavior {
        ToolCallBehavior::None => None,
        ToolCallBehavior::EnableFunctions | ToolCallBehavior::AutoInvoke { .. } => {
            Some(json!({ "functionCallingConfig": { "mode": "AUTO" } }))
        }
        ToolCallBehavior::Required { function } => Some(json!({
            "functionCallingConfig": { "mode": "ANY", "allowedFunctionNames": [function] }
        })),
    }
}

pub(super) fn build_generate_body(request: &ChatRequest) -> Result<Value, LlmError> {
    let history = validate_history(&request.messages, SystemMessagePolicy::Separate)?;
    let settings = &request.settings;

    let mut body = Map::new();
    body.insert("contents".into(), Value::Array(contents(&history.messages)?));
    if let Some(system) = history.system {
        body.insert(
            "systemInstruction".into(),
            json!({ "parts": [{ "text": system }] }),
        );
    }
    let config = generation_config(settings);
    if !config.is_empty() {
        body.insert("generationConfig".into(), Value::Object(config));
    }

    let tools = request.active_tools();
    if !tools.is_empty() {
        let declarations: Vec<Value> = tools
            .iter()
            .map(|t| json!({ "name": t.name, "description": t.description, "parameters": t.parameters }))
            .collect();
        body.insert("tools".into(), json!([{ "functionDeclarations": declarations }]));
        insert_opt(&mut body, "toolConfig", tool_config(settings.tool_call_behavior()));
    }
    merge_extensions(&mut body, settings);
    Ok(Value::Object(body))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub model_version: Option<String>,
    pub response_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Part {
    pub text: Option<String>,
    pub function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
    pub total_token_count: Option<u32>,
}

impl UsageMetadata {
    pub(super) fn to_usage(&self) -> Usage {
        Usage::from_counts(
            self.prompt_token_count,
            self.candidates_token_count,
            self.total_token_count,
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PromptFeedback {
    pub block_reason: Option<String>,
}

pub(super) fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::Length,
        other if BLOCKED_FINISH_REASONS.contains(&other) => FinishReason::ContentFilter,
        other => FinishReason::Other(other.to_string()),
    }
}

/// Reject error objects, blocked prompts and withheld candidates.
pub(super) fn check_response(
    document: &Value,
    parsed: &GenerateContentResponse,
) -> Result<(), LlmError> {
    if let Some(error) = document.get("error") {
        return Err(LlmError::provider(
            PROVIDER,
            error["message"].as_str().unwrap_or("request failed").to_string(),
            error["status"].as_str().map(str::to_string),
            Some(document.to_string()),
        ));
    }
    if let Some(reason) = parsed
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        tracing::warn!(provider = PROVIDER, reason, "prompt blocked");
        return Err(LlmError::provider(
            PROVIDER,
            format!("prompt blocked: {reason}"),
            Some(reason.to_string()),
            Some(document.to_string()),
        ));
    }
    for candidate in &parsed.candidates {
        if let Some(reason) = candidate
            .finish_reason
            .as_deref()
            .filter(|r| BLOCKED_FINISH_REASONS.contains(r))
        {
            tracing::warn!(provider = PROVIDER, reason, "candidate blocked");
            return Err(LlmError::provider(
                PROVIDER,
                format!("response blocked: {reason}"),
                Some(reason.to_string()),
                Some(document.to_string()),
            ));
        }
    }
    Ok(())
}

/// Gemini does not assign call ids; generate one per call.
pub(super) fn new_call_id() -> String {
    format!("call_{}", uuid::Uuid::new_v4().simple())
}

pub(super) fn parse_generate_response(body: &str) -> Result<ChatResponse, LlmError> {
    let document: Value = decode_json(PROVIDER, body)?;
    let parsed: GenerateContentResponse = decode_json(PROVIDER, body)?;
    check_response(&document, &parsed)?;

    let candidate = parsed.candidates.into_iter().next().ok_or_else(|| {
        LlmError::provider(PROVIDER, "response contained no candidates", None, Some(body.to_string()))
    })?;

    let mut content = String::new();
    let mut tool_calls = Vec::new();
    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if let Some(text) = part.text {
            content.push_str(&text);
        }
        if let Some(call) = part.function_call {
            tool_calls.push(ToolCall::new(new_call_id(), call.name, call.args.to_string()));
        }
    }

    let mut metadata = ResponseMetadata::new(PROVIDER)
        .with_id(parsed.response_id)
        .with_model(parsed.model_version);
    metadata.raw_finish_reason = candidate.finish_reason.clone();

    Ok(ChatResponse {
        content,
        finish_reason: resolve_finish(
            candidate.finish_reason.as_deref().map(map_finish_reason),
            !tool_calls.is_empty(),
        ),
        tool_calls,
        usage: parsed.usage_metadata.map(|u| u.to_usage()).unwrap_or_default(),
        metadata,
    })
}
