//! Machine translation types

use serde::{Deserialize, Serialize};

use super::ResponseMetadata;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub texts: Vec<String>,
    /// Source language; `None` asks the vendor to detect it.
    pub source: Option<String>,
    pub target: String,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            texts: vec![text.into()],
            source: None,
            target: target.into(),
        }
    }

    pub fn batch(texts: Vec<String>, target: impl Into<String>) -> Self {
        Self {
            texts,
            source: None,
            target: target.into(),
        }
    }

    pub fn from_language(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationResponse {
    /// One entry per input text, in input order.
    pub translations: Vec<String>,
    pub detected_source: Option<String>,
    pub metadata: ResponseMetadata,
}
