//! Messages API request and response mapping.

use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::client::PROVIDER;
use crate::defaults;
use crate::error::LlmError;
use crate::history::{SystemMessagePolicy, validate_history};
use crate::http::decode_json;
use crate::providers::common::{insert_opt, merge_extensions, resolve_finish};
use crate::settings::ToolCallBehavior;
use crate::types::{
    ChatMessage, ChatRequest, ChatResponse, FinishReason, MessageRole, ResponseMetadata, ToolCall,
    Usage,
};

/// Content blocks for one history message.
fn content_blocks(message: &ChatMessage) -> Result<Vec<Value>, LlmError> {
    let mut blocks = Vec::new();
    match message.role {
        MessageRole::Tool => {
            blocks.push(json!({
                "type": "tool_result",
                "tool_use_id": message.tool_call_id.as_deref().unwrap_or_default(),
                "content": message.content,
            }));
        }
        _ => {
            if !message.content.is_empty() {
                blocks.push(json!({ "type": "text", "text": message.content }));
            }
            for call in &message.tool_calls {
                blocks.push(json!({
                    "type": "tool_use",
                    "id": call.id,
                    "name": call.name,
                    "input": call.arguments_json()?,
                }));
            }
        }
    }
    Ok(blocks)
}

/// Messages in Anthropic form. Tool results become user turns and adjacent
/// turns of the same role are merged, since roles must alternate.
fn anthropic_messages(messages: &[ChatMessage]) -> Result<Vec<Value>, LlmError> {
    let mut out: Vec<(&'static str, Vec<Value>)> = Vec::new();
    for message in messages {
        let role = match message.role {
            MessageRole::Assistant => "assistant",
            _ => "user",
        };
        let blocks = content_blocks(message)?;
        match out.last_mut() {
            Some((last_role, last_blocks)) if *last_role == role => last_blocks.extend(blocks),
            _ => out.push((role, blocks)),
        }
    }

    Ok(out
        .into_iter()
        .map(|(role, blocks)| match blocks.as_slice() {
            [single] if single["type"] == "text" => {
                json!({ "role": role, "content": single["text"] })
            }
            _ => json!({ "role": role, "content": blocks }),
        })
        .collect())
}

fn tool_choice(behavior: &ToolCallBehavior) -> Option<Value> {
    match behavior {
        ToolCallBehavior::None => None,
        ToolCallBehavior::EnableFunctions | ToolCallBehavior::AutoInvoke { .. } => {
            Some(json!({ "type": "auto" }))
        }
        ToolCallBehavior::Required { function } => Some(json!({ "type": "tool", "name": function })),
    }
}

pub(super) fn build_messages_body(
    request: &ChatRequest,
    default_model: &str,
    stream: bool,
) -> Result<Value, LlmError> {
    let history = validate_history(&request.messages, SystemMessagePolicy::Separate)?;
    let settings = &request.settings;

    let mut body = Map::new();
    body.insert("model".into(), json!(settings.model_or(default_model)));
    body.insert(
        "max_tokens".into(),
        json!(settings.max_tokens().unwrap_or(defaults::anthropic::MAX_TOKENS)),
    );
    insert_opt(&mut body, "system", history.system);
    body.insert("messages".into(), Value::Array(anthropic_messages(&history.messages)?));
    insert_opt(&mut body, "temperature", settings.temperature());
    insert_opt(&mut body, "top_p", settings.top_p());
    insert_opt(&mut body, "top_k", settings.top_k());
    if !settings.stop_sequences().is_empty() {
        body.insert("stop_sequences".into(), json!(settings.stop_sequences()));
    }
    if let Some(user) = settings.user() {
        body.insert("metadata".into(), json!({ "user_id": user }));
    }

    let tools = request.active_tools();
    if !tools.is_empty() {
        body.insert(
            "tools".into(),
            Value::Array(
                tools
                    .iter()
                    .map(|t| {
                        json!({
                            "name": t.name,
                            "description": t.description,
                            "input_schema": t.parameters,
                        })
                    })
                    .collect(),
            ),
        );
        insert_opt(&mut body, "tool_choice", tool_choice(settings.tool_call_behavior()));
    }
    if stream {
        body.insert("stream".into(), json!(true));
    }
    merge_extensions(&mut body, settings);
    Ok(Value::Object(body))
}

pub(super) fn map_stop_reason(reason: &str) -> FinishReason {
    match reason {
        "end_turn" | "stop_sequence" => FinishReason::Stop,
        "max_tokens" => FinishReason::Length,
        "tool_use" => FinishReason::ToolCalls,
        "refusal" => FinishReason::ContentFilter,
        other => FinishReason::Other(other.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AnthropicUsage {
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
}

impl AnthropicUsage {
    pub(super) fn to_usage(&self) -> Usage {
        Usage::from_counts(self.input_tokens, self.output_tokens, None)
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    id: Option<String>,
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    stop_sequence: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    ToolUse { id: String, name: String, input: Value },
    #[serde(other)]
    Other,
}

pub(super) fn parse_messages_response(body: &str) -> Result<ChatResponse, LlmError> {
    let parsed: MessagesResponse = decode_json(PROVIDER, body)?;

    let mut content = String::new();
    let mut tool_calls = Vec::new();
    for block in parsed.content {
        match block {
            ContentBlock::Text { text } => content.push_str(&text),
            ContentBlock::ToolUse { id, name, input } => {
                tool_calls.push(ToolCall::new(id, name, input.to_string()))
            }
            ContentBlock::Other => {}
        }
    }

    let mut metadata = ResponseMetadata::new(PROVIDER)
        .with_id(parsed.id)
        .with_model(parsed.model);
    metadata.raw_finish_reason = parsed.stop_reason.clone();
    metadata.stop_sequence = parsed.stop_sequence;

    Ok(ChatResponse {
        content,
        finish_reason: resolve_finish(
            parsed.stop_reason.as_deref().map(map_stop_reason),
            !tool_calls.is_empty(),
        ),
        tool_calls,
        usage: parsed.usage.map(|u| u.to_usage()).unwrap_or_default(),
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ExecutionSettings;
    use crate::types::Tool;

    #[test]
    fn tool_round_trip_alternates_roles() {
        let history = vec![
            ChatMessage::user("weather in Paris and Rome?"),
            ChatMessage::assistant_tool_calls(vec![
                ToolCall::new("tu_1", "get_weather", r#"{"city":"Paris"}"#),
                ToolCall::new("tu_2", "get_weather", r#"{"city":"Rome"}"#),
            ]),
            ChatMessage::tool_result("tu_1", "18C"),
            ChatMessage::tool_result("tu_2", "24C"),
        ];
        let settings = ExecutionSettings::builder()
            .tool_call_behavior(ToolCallBehavior::EnableFunctions)
            .build()
            .unwrap();
        let request = ChatRequest::new(history)
            .with_tools(vec![Tool::function("get_weather", "Weather", json!({"type":"object"}))])
            .with_settings(settings);
        let body = build_messages_body(&request, "claude", false).unwrap();

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["content"][0]["type"], "tool_use");
        assert_eq!(messages[1]["content"][0]["input"]["city"], "Paris");
        assert_eq!(messages[2]["role"], "user");
        assert_eq!(messages[2]["content"][1]["tool_use_id"], "tu_2");
        assert_eq!(body["tools"][0]["input_schema"]["type"], "object");
        assert_eq!(body["tool_choice"]["type"], "auto");
    }

    #[test]
    fn explicit_max_tokens_overrides_default() {
        let settings = ExecutionSettings::builder().max_tokens(100).build().unwrap();
        let request = ChatRequest::new(vec![ChatMessage::user("hi")]).with_settings(settings);
        let body = build_messages_body(&request, "claude", true).unwrap();
        assert_eq!(body["max_tokens"], 100);
        assert_eq!(body["stream"], true);
        assert!(body.get("system").is_none());
    }

    #[test]
    fn parses_tool_use_blocks() {
        let body = r#"{"id":"msg_1","content":[{"type":"text","text":"Checking."},
            {"type":"tool_use","id":"tu_1","name":"get_weather","input":{"city":"Paris"}}],
            "stop_reason":"tool_use","usage":{"input_tokens":10}}"#;
        let resp = parse_messages_response(body).unwrap();
        assert_eq!(resp.content, "Checking.");
        assert_eq!(resp.tool_calls[0].arguments_json().unwrap()["city"], "Paris");
        assert_eq!(resp.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(resp.usage.completion_tokens, 0);
    }
}
