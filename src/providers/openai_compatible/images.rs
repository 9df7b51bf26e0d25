//! OpenAI image generation.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::OpenAiCompatibleClient;
use crate::defaults;
use crate::error::LlmError;
use crate::http::{decode_json, post_json};
use crate::providers::common::insert_opt;
use crate::traits::ImageGenerationCapability;
use crate::types::{GeneratedImage, ImageGenerationRequest, ImageGenerationResponse};

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    created: Option<i64>,
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
    b64_json: Option<String>,
    revised_prompt: Option<String>,
}

fn build_image_body(request: &ImageGenerationRequest) -> Result<Value, LlmError> {
    if request.prompt.trim().is_empty() {
        return Err(LlmError::InvalidInput("image prompt must not be empty".to_string()));
    }
    let settings = &request.settings;
    let mut body = Map::new();
    body.insert(
        "model".into(),
        json!(settings.model.as_deref().unwrap_or(defaults::openai::IMAGE_MODEL)),
    );
    body.insert("prompt".into(), json!(request.prompt));
    insert_opt(&mut body, "n", settings.count);
    insert_opt(&mut body, "size", settings.size.as_deref());
    insert_opt(&mut body, "quality", settings.quality.as_deref());
    insert_opt(&mut body, "style", settings.style.as_deref());
    insert_opt(&mut body, "response_format", settings.response_format.as_deref());
    Ok(Value::Object(body))
}

fn parse_images(provider: &str, body: &str) -> Result<ImageGenerationResponse, LlmError> {
    let parsed: ImagesResponse = decode_json(provider, body)?;
    if parsed.data.is_empty() {
        return Err(LlmError::provider(
            provider,
            "image generation returned no images",
            None,
            Some(body.to_string()),
        ));
    }
    Ok(ImageGenerationResponse {
        images: parsed
            .data
            .into_iter()
            .map(|d| GeneratedImage {
                url: d.url,
                b64_json: d.b64_json,
                revised_prompt: d.revised_prompt,
            })
            .collect(),
        created: parsed.created.and_then(|s| chrono::DateTime::from_timestamp(s, 0)),
    })
}

#[async_trait]
impl ImageGenerationCapability for OpenAiCompatibleClient {
    async fn generate_images(
        &self,
        request: ImageGenerationRequest,
    ) -> Result<ImageGenerationResponse, LlmError> {
        let body = build_image_body(&request)?;
        let text = post_json(
            self.http(),
            self.provider(),
            &self.endpoint("images/generations"),
            self.headers()?,
            &body,
        )
        .await?;
        parse_images(self.provider(), &text)
    }
}
