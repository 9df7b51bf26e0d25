//! # kernel-connectors
//!
//! Connectors for LLM, image, speech and machine-translation vendor APIs,
//! with a focus on Chinese cloud vendors (Tencent HunYuan, Baidu QianFan,
//! Alibaba DashScope, iFlytek SparkDesk, Volcano Engine, Youdao) next to
//! OpenAI-compatible services, Anthropic and Gemini.
//!
//! Each connector implements one or more capability traits
//! ([`ChatCapability`](traits::ChatCapability),
//! [`ImageGenerationCapability`](traits::ImageGenerationCapability),
//! [`SpeechCapability`](traits::SpeechCapability),
//! [`TranslationCapability`](traits::TranslationCapability)) and is built with
//! a per-vendor builder that falls back to environment variables for
//! credentials.
#![deny(unsafe_code)]

//! ## Quick Start
//!
//! ```rust,no_run
//! use kernel_connectors::prelude::*;
//! use kernel_connectors::providers::hunyuan::HunYuanBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), LlmError> {
//!     // Reads TENCENTCLOUD_SECRET_ID / TENCENTCLOUD_SECRET_KEY.
//!     let client = HunYuanBuilder::new().model("hunyuan-pro").build()?;
//!
//!     let settings = ExecutionSettings::builder().temperature(0.3).build()?;
//!     let request = ChatRequest::new(vec![
//!         ChatMessage::system("You are a concise assistant."),
//!         ChatMessage::user("Introduce yourself in one sentence."),
//!     ])
//!     .with_settings(settings);
//!
//!     let response = client.chat(request).await?;
//!     println!("{}", response.content);
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming
//!
//! `chat_stream` returns a pull-based [`ChatStream`](types::ChatStream).
//! Dropping the stream closes the connection;
//! [`chat_stream_with_cancel`](traits::ChatCapability::chat_stream_with_cancel)
//! ties it to a `CancellationToken` instead.

pub mod auth;
pub mod builder;
pub mod defaults;
pub mod error;
pub mod history;
pub mod http;
pub mod providers;
pub mod settings;
pub mod streaming;
pub mod traits;
pub mod types;

pub use error::LlmError;

/// Common imports.
pub mod prelude {
    pub use crate::error::{ErrorCategory, LlmError};
    pub use crate::history::{PreparedHistory, SystemMessagePolicy, validate_history};
    pub use crate::http::{HttpConfig, HttpConfigBuilder};
    pub use crate::settings::{ExecutionSettings, ExecutionSettingsBuilder, ToolCallBehavior};
    pub use crate::streaming::collect_chat_response;
    pub use crate::traits::{
        ChatCapability, ImageGenerationCapability, SpeechCapability, TranslationCapability,
    };
    pub use crate::types::*;
    pub use tokio_util::sync::CancellationToken;
}
