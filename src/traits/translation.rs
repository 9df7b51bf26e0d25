//! Machine translation capability trait

use async_trait::async_trait;

use crate::error::LlmError;
use crate::types::{TranslationRequest, TranslationResponse};

#[async_trait]
pub trait TranslationCapability: Send + Sync {
    async fn translate(&self, request: TranslationRequest)
    -> Result<TranslationResponse, LlmError>;

    /// Translate a single text into `target`.
    async fn translate_text(&self, text: String, target: String) -> Result<String, LlmError> {
        let response = self
            .translate(TranslationRequest::new(text, target))
            .await?;
        response.translations.into_iter().next().ok_or_else(|| {
            LlmError::InternalError("Translation response contained no text".to_string())
        })
    }
}
