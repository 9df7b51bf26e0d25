//! OpenAI chat-completions compatible connector.
//!
//! One client covers OpenAI itself, Azure OpenAI (deployment URLs with the
//! `api-key` header), MistralAI and DouBao (Volcengine Ark). OpenAI image
//! generation and speech synthesis are served from the same client.

mod builder;
mod client;
mod images;
mod speech;
mod streaming;
mod transformers;

pub use builder::{AuthStyle, OpenAiCompatibleBuilder};
pub use client::OpenAiCompatibleClient;
