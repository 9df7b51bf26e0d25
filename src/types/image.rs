//! Text-to-image types

use serde::{Deserialize, Serialize};

/// Draw settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSettings {
    pub model: Option<String>,
    /// e.g. `1024x1024`.
    pub size: Option<String>,
    pub count: Option<u32>,
    pub quality: Option<String>,
    pub style: Option<String>,
    /// `url` or `b64_json`.
    pub response_format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub settings: ImageSettings,
}

impl ImageGenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            settings: ImageSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: Option<String>,
    pub b64_json: Option<String>,
    pub revised_prompt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageGenerationResponse {
    pub images: Vec<GeneratedImage>,
    pub created: Option<chrono::DateTime<chrono::Utc>>,
}
