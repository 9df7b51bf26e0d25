//! Vendor connectors.
//!
//! Each connector follows the same path: validate the history, build the
//! vendor request, authenticate, send, check the vendor's own error and
//! finish codes, then map the response back into the shared types. Request
//! and response DTOs stay private to the connector.

pub(crate) mod common;

#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "dashscope")]
pub mod dashscope;
#[cfg(feature = "google")]
pub mod gemini;
#[cfg(feature = "hunyuan")]
pub mod hunyuan;
#[cfg(feature = "openai")]
pub mod openai_compatible;
#[cfg(feature = "qianfan")]
pub mod qianfan;
#[cfg(feature = "sparkdesk")]
pub mod sparkdesk;
#[cfg(feature = "translation")]
pub mod tencent_translate;
#[cfg(feature = "translation")]
pub mod volcano_translate;
#[cfg(feature = "translation")]
pub mod youdao_translate;
