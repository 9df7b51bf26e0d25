//! OpenAI text-to-speech.

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use super::OpenAiCompatibleClient;
use crate::defaults;
use crate::error::LlmError;
use crate::http::post_stream;
use crate::providers::common::insert_opt;
use crate::traits::SpeechCapability;
use crate::types::{TtsRequest, TtsResponse};

const DEFAULT_FORMAT: &str = "mp3";

fn build_speech_body(request: &TtsRequest) -> Result<Value, LlmError> {
    if request.text.trim().is_empty() {
        return Err(LlmError::InvalidInput("speech text must not be empty".to_string()));
    }
    let settings = &request.settings;
    let mut body = Map::new();
    body.insert(
        "model".into(),
        json!(settings.model.as_deref().unwrap_or(defaults::openai::TTS_MODEL)),
    );
    body.insert("input".into(), json!(request.text));
    body.insert(
        "voice".into(),
        json!(settings.voice.as_deref().unwrap_or(defaults::openai::TTS_VOICE)),
    );
    body.insert(
        "response_format".into(),
        json!(settings.format.as_deref().unwrap_or(DEFAULT_FORMAT)),
    );
    insert_opt(&mut body, "speed", settings.speed);
    Ok(Value::Object(body))
}

#[async_trait]
impl SpeechCapability for OpenAiCompatibleClient {
    async fn tts(&self, request: TtsRequest) -> Result<TtsResponse, LlmError> {
        let body = build_speech_body(&request)?;
        let response = post_stream(
            self.http(),
            self.provider(),
            &self.endpoint("audio/speech"),
            self.headers()?,
            &body,
        )
        .await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let audio = response
            .bytes()
            .await
            .map_err(|e| {
                LlmError::HttpError(format!(
                    "{} audio read failed: {}",
                    self.provider(),
                    e.without_url()
                ))
            })?;
        if audio.is_empty() {
            return Err(LlmError::provider(self.provider(), "speech synthesis returned no audio", None, None));
        }
        Ok(TtsResponse {
            audio: audio.to_vec(),
            format: request
                .settings
                .format
                .unwrap_or_else(|| DEFAULT_FORMAT.to_string()),
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::openai_compatible::OpenAiCompatibleBuilder;

    #[test]
    fn body_uses_defaults() {
        let body = build_speech_body(&TtsRequest::new("hello")).unwrap();
        assert_eq!(body["model"], "tts-1");
        assert_eq!(body["voice"], "alloy");
        assert_eq!(body["response_format"], "mp3");
        assert_eq!(body["input"], "hello");
    }

    #[tokio::test]
    async fn returns_raw_audio_bytes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/audio/speech")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "audio/mpeg")
            .with_body(vec![0xFF, 0xFB, 0x90])
            .create_async()
            .await;

        let client = OpenAiCompatibleBuilder::openai()
            .api_key("sk-test")
            .base_url(server.url())
            .build()
            .unwrap();
        let resp = client.tts(TtsRequest::new("hello")).await.unwrap();
        assert_eq!(resp.audio, vec![0xFF, 0xFB, 0x90]);
        assert_eq!(resp.content_type.as_deref(), Some("audio/mpeg"));
        mock.assert_async().await;
    }
}
