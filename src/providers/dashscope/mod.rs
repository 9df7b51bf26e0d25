//! Alibaba DashScope (Qwen) text-generation connector.
//!
//! Requests always ask for `result_format=message` so tool calls come back
//! in the OpenAI shape. Streaming is SSE, enabled by the `X-DashScope-SSE`
//! header, with `incremental_output` so each event carries only the delta.

mod builder;
mod client;
mod transformers;

pub use builder::DashScopeBuilder;
pub use client::DashScopeClient;
