//! Capability traits implemented by connectors.

mod chat;
mod image;
mod speech;
mod translation;

pub use chat::ChatCapability;
pub use image::ImageGenerationCapability;
pub use speech::SpeechCapability;
pub use translation::TranslationCapability;
