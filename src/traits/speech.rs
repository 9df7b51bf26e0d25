//! Speech (text-to-speech) capability trait

use async_trait::async_trait;

use crate::error::LlmError;
use crate::types::{TtsRequest, TtsResponse};

#[async_trait]
pub trait SpeechCapability: Send + Sync {
    async fn tts(&self, request: TtsRequest) -> Result<TtsResponse, LlmError>;
}
