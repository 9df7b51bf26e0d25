//! Tencent HunYuan `ChatCompletions` connector (TC3-signed, PascalCase DTOs).

mod builder;
mod client;
mod transformers;

pub use builder::HunYuanBuilder;
pub use client::HunYuanClient;
