//! Image generation capability trait

use async_trait::async_trait;

use crate::error::LlmError;
use crate::types::{ImageGenerationRequest, ImageGenerationResponse};

#[async_trait]
pub trait ImageGenerationCapability: Send + Sync {
    async fn generate_images(
        &self,
        request: ImageGenerationRequest,
    ) -> Result<ImageGenerationResponse, LlmError>;

    /// Generate images and return their URLs, skipping base64-only results.
    async fn generate_image_urls(&self, prompt: String) -> Result<Vec<String>, LlmError> {
        let response = self
            .generate_images(ImageGenerationRequest::new(prompt))
            .await?;
        Ok(response
            .images
            .into_iter()
            .filter_map(|img| img.url)
            .collect())
    }
}
