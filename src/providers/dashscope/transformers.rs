//! Generation request/response mapping and stream conversion.

use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::client::PROVIDER;
use crate::error::LlmError;
use crate::history::{SystemMessagePolicy, validate_history};
use crate::http::decode_json;
use crate::providers::common::{
    insert_opt, merge_extensions, openai_message_json, openai_tools_json, resolve_finish,
    tool_name_for_result,
};
use crate::streaming::ChatEventConverter;
use crate::types::{
    ChatRequest, ChatResponse, ChatStreamEvent, FinishReason, MessageRole, ResponseMetadata,
    ToolCall, Usage,
};

pub(super) fn build_generation_body(
    request: &ChatRequest,
    default_model: &str,
    stream: bool,
) -> Result<Value, LlmError> {
    let history = validate_history(&request.messages, SystemMessagePolicy::Inline)?;
    let settings = &request.settings;

    // Tool results must name the function they answer.
    let messages: Vec<Value> = history
        .messages
        .iter()
        .map(|m| {
            let mut v = openai_message_json(m);
            if m.role == MessageRole::Tool {
                v["name"] = json!(tool_name_for_result(&history.messages, m));
            }
            if m.has_tool_calls() && m.content.is_empty() {
                v["content"] = json!("");
            }
            v
        })
        .collect();

    let mut parameters = Map::new();
    parameters.insert("result_format".into(), json!("message"));
    insert_opt(&mut parameters, "temperature", settings.temperature());
    insert_opt(&mut parameters, "top_p", settings.top_p());
    insert_opt(&mut parameters, "top_k", settings.top_k());
    insert_opt(&mut parameters, "max_tokens", settings.max_tokens());
    insert_opt(&mut parameters, "seed", settings.seed());
    insert_opt(&mut parameters, "presence_penalty", settings.presence_penalty());
    if !settings.stop_sequences().is_empty() {
        parameters.insert("stop".into(), json!(settings.stop_sequences()));
    }
    let tools = request.active_tools();
    if !tools.is_empty() {
        parameters.insert("tools".into(), openai_tools_json(tools));
        insert_opt(
            &mut parameters,
            "tool_choice",
            settings.tool_call_behavior().openai_tool_choice(),
        );
    }
    if stream {
        parameters.insert("incremental_output".into(), json!(true));
    }
    merge_extensions(&mut parameters, settings);

    Ok(json!({
        "model": settings.model_or(default_model),
        "input": { "messages": messages },
        "parameters": parameters,
    }))
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    output: Option<Output>,
    usage: Option<DashScopeUsage>,
    request_id: Option<String>,
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Output {
    #[serde(default)]
    choices: Vec<Choice>,
    /// Legacy `result_format=text` field.
    text: Option<String>,
    search_info: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<OutputMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OutputMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<OutputToolCall>,
}

#[derive(Debug, Deserialize)]
struct OutputToolCall {
    #[serde(default)]
    index: usize,
    id: Option<String>,
    #[serde(default)]
    function: OutputFunction,
}

#[derive(Debug, Default, Deserialize)]
struct OutputFunction {
    name: Option<String>,
    arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DashScopeUsage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

impl DashScopeUsage {
    fn to_usage(&self) -> Usage {
        Usage::from_counts(self.input_tokens, self.output_tokens, self.total_tokens)
    }
}

/// DashScope reports an unfinished choice as the string `"null"`.
fn map_finish_reason(reason: Option<&str>) -> Option<FinishReason> {
    match reason {
        None | Some("null") | Some("") => None,
        Some(r) => Some(FinishReason::from_openai_style(r)),
    }
}

fn check_vendor_error(parsed: &GenerationResponse, raw: &str) -> Result<(), LlmError> {
    match &parsed.code {
        Some(code) if !code.is_empty() => {
            tracing::warn!(provider = PROVIDER, code, "vendor error");
            Err(LlmError::provider(
                PROVIDER,
                parsed.message.clone().unwrap_or_else(|| code.clone()),
                Some(code.clone()),
                Some(raw.to_string()),
            ))
        }
        _ => Ok(()),
    }
}

pub(super) fn parse_generation_response(body: &str) -> Result<ChatResponse, LlmError> {
    let parsed: GenerationResponse = decode_json(PROVIDER, body)?;
    check_vendor_error(&parsed, body)?;
    let output = parsed.output.ok_or_else(|| {
        LlmError::response_format(PROVIDER, "missing `output`", body)
    })?;

    let mut metadata = ResponseMetadata::new(PROVIDER).with_request_id(parsed.request_id);
    metadata.search_info = output.search_info;

    let (content, tool_calls, raw_finish) = match output.choices.into_iter().next() {
        Some(choice) => {
            let message = choice.message.unwrap_or(OutputMessage {
                content: String::new(),
                tool_calls: Vec::new(),
            });
            let calls: Vec<ToolCall> = message
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
            (message.content, calls, choice.finish_reason)
        }
        None => match output.text {
            Some(text) => (text, Vec::new(), None),
            None => {
                return Err(LlmError::provider(
                    PROVIDER,
                    "response contained no choices",
                    None,
                    Some(body.to_string()),
                ));
            }
        },
    };
    metadata.raw_finish_reason = raw_finish.clone();

    Ok(ChatResponse {
        content,
        finish_reason: resolve_finish(map_finish_reason(raw_finish.as_deref()), !tool_calls.is_empty()),
        tool_calls,
        usage: parsed.usage.map(|u| u.to_usage()).unwrap_or_default(),
        metadata,
    })
}

pub(super) struct DashScopeEventConverter {
    metadata: ResponseMetadata,
    started: bool,
    finish_reason: Option<FinishReason>,
    usage: Option<Usage>,
}

impl DashScopeEventConverter {
    pub(super) fn new() -> Self {
        Self {
            metadata: ResponseMetadata::new(PROVIDER),
            started: false,
            finish_reason: None,
            usage: None,
        }
    }
}

impl ChatEventConverter for DashScopeEventConverter {
    fn convert(&mut self, document: Value) -> Result<Vec<ChatStreamEvent>, LlmError> {
        let raw = document.to_string();
        let parsed: GenerationResponse = serde_json::from_value(document)
            .map_err(|e| LlmError::response_format(PROVIDER, e, raw.as_str()))?;
        check_vendor_error(&parsed, &raw)?;

        let mut events = Vec::new();
        if !self.started {
            self.started = true;
            self.metadata.request_id = parsed.request_id.clone();
            events.push(ChatStreamEvent::StreamStart {
                metadata: self.metadata.clone(),
            });
        }

        if let Some(output) = parsed.output {
            if output.search_info.is_some() {
                self.metadata.search_info = output.search_info;
            }
            for choice in output.choices {
                if let Some(message) = choice.message {
                    if !message.content.is_empty() {
                        events.push(ChatStreamEvent::content(message.content));
                    }
                    for call in message.tool_calls {
                        events.push(ChatStreamEvent::ToolCallDelta {
                            index: call.index,
                            id: call.id.filter(|id| !id.is_empty()),
                            name: call.function.name.filter(|n| !n.is_empty()),
                            arguments_delta: call.function.arguments,
                        });
                    }
                }
                if let Some(reason) = map_finish_reason(choice.finish_reason.as_deref()) {
                    self.finish_reason = Some(reason);
                    self.metadata.raw_finish_reason = choice.finish_reason;
                }
            }
        }

        // Usage is cumulative; report it once at the end.
        if let Some(usage) = parsed.usage {
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
