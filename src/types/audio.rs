//! Text-to-speech types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeechSettings {
    pub model: Option<String>,
    pub voice: Option<String>,
    /// `mp3`, `opus`, `aac`, `flac`, `wav`, `pcm`.
    pub format: Option<String>,
    pub speed: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    pub settings: SpeechSettings,
}

impl TtsRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            settings: SpeechSettings::default(),
        }
    }
}

/// Generated audio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TtsResponse {
    pub audio: Vec<u8>,
    pub format: String,
    pub content_type: Option<String>,
}
