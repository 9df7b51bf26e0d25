//! Google Gemini `generateContent` connector.
//!
//! The API key travels as the `key` query parameter. Streaming uses
//! `streamGenerateContent`, which returns one JSON array delivered in
//! arbitrary chunks; it is split with the chunked JSON document codec.

mod builder;
mod client;
mod streaming;
mod transformers;

pub use builder::GeminiBuilder;
pub use client::GeminiClient;
