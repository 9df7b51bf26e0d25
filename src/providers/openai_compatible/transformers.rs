//! Request and response mapping for chat completions.

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::error::LlmError;
use crate::history::{SystemMessagePolicy, validate_history};
use crate::http::decode_json;
use crate::providers::common::{
    content_filtered, insert_opt, merge_extensions, openai_message_json, openai_tools_json,
    resolve_finish,
};
use crate::types::{ChatRequest, ChatResponse, FinishReason, ResponseMetadata, ToolCall, Usage};

pub(super) fn build_chat_body(
    request: &ChatRequest,
    default_model: &str,
    stream: bool,
    include_stream_usage: bool,
) -> Result<Value, LlmError> {
    let history = validate_history(&request.messages, SystemMessagePolicy::Inline)?;
    let settings = &request.settings;

    let mut body = Map::new();
    body.insert("model".into(), json!(settings.model_or(default_model)));
    body.insert(
        "messages".into(),
        Value::Array(history.messages.iter().map(openai_message_json).collect()),
    );
    insert_opt(&mut body, "temperature", settings.temperature());
    insert_opt(&mut body, "top_p", settings.top_p());
    insert_opt(&mut body, "max_tokens", settings.max_tokens());
    insert_opt(&mut body, "presence_penalty", settings.presence_penalty());
    insert_opt(&mut body, "frequency_penalty", settings.frequency_penalty());
    insert_opt(&mut body, "seed", settings.seed());
    insert_opt(&mut body, "user", settings.user());
    if !settings.stop_sequences().is_empty() {
        body.insert("stop".into(), json!(settings.stop_sequences()));
    }

    let tools = request.active_tools();
    if !tools.is_empty() {
        body.insert("tools".into(), openai_tools_json(tools));
        insert_opt(
            &mut body,
            "tool_choice",
            settings.tool_call_behavior().openai_tool_choice(),
        );
    }

    if stream {
        body.insert("stream".into(), json!(true));
        if include_stream_usage {
            body.insert("stream_options".into(), json!({ "include_usage": true }));
        }
    }
    merge_extensions(&mut body, settings);
    Ok(Value::Object(body))
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    id: Option<String>,
    model: Option<String>,
    created: Option<i64>,
    system_fingerprint: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ResponseToolCall>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    id: String,
    function: ResponseFunction,
}

#[derive(Debug, Deserialize)]
struct ResponseFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

pub(super) fn parse_chat_response(provider: &str, body: &str) -> Result<ChatResponse, LlmError> {
    let completion: ChatCompletion = decode_json(provider, body)?;
    let choice = completion.choices.into_iter().next().ok_or_else(|| {
        LlmError::provider(provider, "response contained no choices", None, Some(body.to_string()))
    })?;

    if choice.finish_reason.as_deref() == Some("content_filter") {
        return Err(content_filtered(provider, "content_filter", body.to_string()));
    }

    let tool_calls: Vec<ToolCall> = choice
        .message
        .tool_calls
        .into_iter()
        .map(|c| ToolCall::new(c.id, c.function.name, c.function.arguments))
        .collect();

    let mut metadata = ResponseMetadata::new(provider)
        .with_id(completion.id)
        .with_model(completion.model)
        .with_created_unix(completion.created);
    metadata.system_fingerprint = completion.system_fingerprint;
    metadata.raw_finish_reason = choice.finish_reason.clone();

    Ok(ChatResponse {
        content: choice.message.content.unwrap_or_default(),
        finish_reason: resolve_finish(
            choice.finish_reason.as_deref().map(FinishReason::from_openai_style),
            !tool_calls.is_empty(),
        ),
        tool_calls,
        usage: completion.usage.unwrap_or_default(),
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ExecutionSettings, ToolCallBehavior};
    use crate::types::{ChatMessage, Tool};

    fn request() -> ChatRequest {
        ChatRequest::new(vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("hello"),
        ])
    }

    #[test]
    fn body_keeps_system_inline_and_maps_settings() {
        let settings = ExecutionSettings::builder()
            .temperature(0.2)
            .max_tokens(64)
            .stop_sequences(["END"])
            .build()
            .unwrap();
        let body = build_chat_body(&request().with_settings(settings), "gpt-4o-mini", false, false)
            .unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["stop"][0], "END");
        assert!(body.get("stream").is_none());
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn tools_only_sent_when_enabled() {
        let tool = Tool::function("get_weather", "Weather", json!({"type":"object"}));
        let disabled = build_chat_body(&request().with_tools(vec![tool.clone()]), "m", false, false)
            .unwrap();
        assert!(disabled.get("tools").is_none());

        let settings = ExecutionSettings::builder()
            .tool_call_behavior(ToolCallBehavior::EnableFunctions)
            .build()
            .unwrap();
        let enabled = build_chat_body(
            &request().with_tools(vec![tool]).with_settings(settings),
            "m",
            true,
            true,
        )
        .unwrap();
        assert_eq!(enabled["tools"][0]["function"]["name"], "get_weather");
        assert_eq!(enabled["tool_choice"], "auto");
        assert_eq!(enabled["stream_options"]["include_usage"], true);
    }

    #[test]
    fn parses_tool_call_response() {
        let body = r#"{"id":"chatcmpl-1","model":"gpt-4o","created":1700000000,
            "choices":[{"index":0,"message":{"role":"assistant","content":null,
            "tool_calls":[{"id":"call_1","type":"function","function":{"name":"get_weather","arguments":"{\"city\":\"Paris\"}"}}]},
            "finish_reason":"tool_calls"}],
            "usage":{"prompt_tokens":10,"completion_tokens":5,"total_tokens":15}}"#;
        let resp = parse_chat_response("openai", body).unwrap();
        assert_eq!(resp.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(resp.tool_calls[0].arguments_json().unwrap()["city"], "Paris");
        assert_eq!(resp.usage.total_tokens, 15);
        assert_eq!(resp.metadata.id.as_deref(), Some("chatcmpl-1"));
        assert!(resp.metadata.created.is_some());
    }

    #[test]
    fn content_filter_is_an_error() {
        let body = r#"{"choices":[{"message":{"content":""},"finish_reason":"content_filter"}]}"#;
        let err = parse_chat_response("azure", body).unwrap_err();
        match err {
            LlmError::ProviderError { error_code, .. } => {
                assert_eq!(error_code.as_deref(), Some("content_filter"))
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_usage_defaults_to_zero() {
        let body = r#"{"choices":[{"message":{"content":"hi"},"finish_reason":"stop"}]}"#;
        let resp = parse_chat_response("mistral", body).unwrap();
        assert_eq!(resp.usage, Usage::default());
        assert_eq!(resp.content, "hi");
    }

    #[test]
    fn empty_choices_is_a_provider_error() {
        let err = parse_chat_response("openai", r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, LlmError::ProviderError { .. }));
    }
}
