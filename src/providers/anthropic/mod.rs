//! Anthropic Messages API connector.
//!
//! The system prompt goes into the top-level `system` field, tool calls are
//! `tool_use` content blocks and tool results are `tool_result` blocks inside a
//! user turn. `max_tokens` is mandatory and defaults to 4096.

mod builder;
mod client;
mod streaming;
mod transformers;

pub use builder::AnthropicBuilder;
pub use client::AnthropicClient;
