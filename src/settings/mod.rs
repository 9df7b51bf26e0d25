//! Execution settings
//!
//! Sampling parameters for one generation request. Settings are assembled with
//! [`ExecutionSettingsBuilder`] and frozen by [`ExecutionSettingsBuilder::build`]:
//! the resulting [`ExecutionSettings`] has no setters. [`ExecutionSettings::to_builder`]
//! yields an independent mutable copy.

mod tool_behavior;

pub use tool_behavior::ToolCallBehavior;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::LlmError;

/// Frozen sampling parameters.
///
/// Deserialization goes through [`ExecutionSettingsBuilder::build`], so a
/// settings document with out-of-range values is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SettingsDocument")]
pub struct ExecutionSettings {
    model_id: Option<String>,
    temperature: Option<f32>,
    top_p: Option<f32>,
    top_k: Option<u32>,
    max_tokens: Option<u32>,
    stop_sequences: Vec<String>,
    presence_penalty: Option<f32>,
    frequency_penalty: Option<f32>,
    seed: Option<u64>,
    user: Option<String>,
    tool_call_behavior: ToolCallBehavior,
    /// Vendor-specific keys passed through verbatim.
    extensions: BTreeMap<String, serde_json::Value>,
}

/// Serialized form of [`ExecutionSettings`], validated before use.
#[derive(Default, Deserialize)]
#[serde(default)]
struct SettingsDocument {
    model_id: Option<String>,
    temperature: Option<f32>,
    top_p: Option<f32>,
    top_k: Option<u32>,
    max_tokens: Option<u32>,
    stop_sequences: Vec<String>,
    presence_penalty: Option<f32>,
    frequency_penalty: Option<f32>,
    seed: Option<u64>,
    user: Option<String>,
    tool_call_behavior: ToolCallBehavior,
    extensions: BTreeMap<String, serde_json::Value>,
}

impl TryFrom<SettingsDocument> for ExecutionSettings {
    type Error = LlmError;

    fn try_from(doc: SettingsDocument) -> Result<Self, Self::Error> {
        ExecutionSettingsBuilder {
            inner: ExecutionSettings {
                model_id: doc.model_id,
                temperature: doc.temperature,
                top_p: doc.top_p,
                top_k: doc.top_k,
                max_tokens: doc.max_tokens,
                stop_sequences: doc.stop_sequences,
                presence_penalty: doc.presence_penalty,
                frequency_penalty: doc.frequency_penalty,
                seed: doc.seed,
                user: doc.user,
                tool_call_behavior: doc.tool_call_behavior,
                extensions: doc.extensions,
            },
        }
        .build()
    }
}

impl ExecutionSettings {
    pub fn builder() -> ExecutionSettingsBuilder {
        ExecutionSettingsBuilder::default()
    }

    /// Mutable copy; changes to it never affect `self`.
    pub fn to_builder(&self) -> ExecutionSettingsBuilder {
        ExecutionSettingsBuilder {
            inner: self.clone(),
        }
    }

    pub fn model_id(&self) -> Option<&str> {
        self.model_id.as_deref()
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    pub fn top_p(&self) -> Option<f32> {
        self.top_p
    }

    pub fn top_k(&self) -> Option<u32> {
        self.top_k
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    pub fn stop_sequences(&self) -> &[String] {
        &self.stop_sequences
    }

    pub fn presence_penalty(&self) -> Option<f32> {
        self.presence_penalty
    }

    pub fn frequency_penalty(&self) -> Option<f32> {
        self.frequency_penalty
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn tool_call_behavior(&self) -> &ToolCallBehavior {
        &self.tool_call_behavior
    }

    pub fn extensions(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.extensions
    }

    pub fn extension(&self, key: &str) -> Option<&serde_json::Value> {
        self.extensions.get(key)
    }

    /// Model from the settings, falling back to the client default.
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model_id().filter(|m| !m.is_empty()).unwrap_or(default)
    }
}

/// Mutable phase of [`ExecutionSettings`].
#[derive(Debug, Clone, Default)]
pub struct ExecutionSettingsBuilder {
    inner: ExecutionSettings,
}

impl ExecutionSettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model_id(mut self, model: impl Into<String>) -> Self {
        self.inner.model_id = Some(model.into());
        self
    }

    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.inner.temperature = Some(temperature);
        self
    }

    pub const fn top_p(mut self, top_p: f32) -> Self {
        self.inner.top_p = Some(top_p);
        self
    }

    pub const fn top_k(mut self, top_k: u32) -> Self {
        self.inner.top_k = Some(top_k);
        self
    }

    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.inner.max_tokens = Some(max_tokens);
        self
    }

    pub fn stop_sequences<I, S>(mut self, stops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.stop_sequences = stops.into_iter().map(Into::into).collect();
        self
    }

    pub const fn presence_penalty(mut self, penalty: f32) -> Self {
        self.inner.presence_penalty = Some(penalty);
        self
    }

    pub const fn frequency_penalty(mut self, penalty: f32) -> Self {
        self.inner.frequency_penalty = Some(penalty);
        self
    }

    pub const fn seed(mut self, seed: u64) -> Self {
        self.inner.seed = Some(seed);
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.inner.user = Some(user.into());
        self
    }

    pub fn tool_call_behavior(mut self, behavior: ToolCallBehavior) -> Self {
        self.inner.tool_call_behavior = behavior;
        self
    }

    /// Add a vendor-specific key, e.g. `enable_search` for DashScope.
    pub fn extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.inner.extensions.insert(key.into(), value);
        self
    }

    /// Validate and freeze.
    pub fn build(self) -> Result<ExecutionSettings, LlmError> {
        let s = &self.inner;
        if let Some(t) = s.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(LlmError::InvalidParameter(format!(
                    "temperature must be between 0.0 and 2.0, got {t}"
                )));
            }
        }
        if let Some(p) = s.top_p {
            if !(0.0..=1.0).contains(&p) {
                return Err(LlmError::InvalidParameter(format!(
                    "top_p must be between 0.0 and 1.0, got {p}"
                )));
            }
        }
        if s.max_tokens == Some(0) {
            return Err(LlmError::InvalidParameter(
                "max_tokens must be greater than zero".to_string(),
            ));
        }
        for (name, value) in [
            ("presence_penalty", s.presence_penalty),
            ("frequency_penalty", s.frequency_penalty),
        ] {
            if let Some(v) = value {
                if !(-2.0..=2.0).contains(&v) {
                    return Err(LlmError::InvalidParameter(format!(
                        "{name} must be between -2.0 and 2.0, got {v}"
                    )));
                }
            }
        }
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_freezes_values() {
        let settings = ExecutionSettings::builder()
            .model_id("hunyuan-pro")
            .temperature(0.7)
            .max_tokens(512)
            .stop_sequences(["###"])
            .build()
            .unwrap();

        assert_eq!(settings.model_id(), Some("hunyuan-pro"));
        assert_eq!(settings.temperature(), Some(0.7));
        assert_eq!(settings.max_tokens(), Some(512));
        assert_eq!(settings.stop_sequences(), ["###".to_string()]);
    }

    #[test]
    fn to_builder_is_an_independent_copy() {
        let frozen = ExecutionSettings::builder()
            .temperature(0.2)
            .extension("enable_search", serde_json::json!(true))
            .build()
            .unwrap();

        let edited = frozen
            .to_builder()
            .temperature(1.1)
            .extension("enable_search", serde_json::json!(false))
            .build()
            .unwrap();

        assert_eq!(frozen.temperature(), Some(0.2));
        assert_eq!(frozen.extension("enable_search"), Some(&serde_json::json!(true)));
        assert_eq!(edited.temperature(), Some(1.1));
        assert_eq!(edited.extension("enable_search"), Some(&serde_json::json!(false)));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(matches!(
            ExecutionSettings::builder().temperature(3.5).build(),
            Err(LlmError::InvalidParameter(_))
        ));
        assert!(matches!(
            ExecutionSettings::builder().top_p(1.5).build(),
            Err(LlmError::InvalidParameter(_))
        ));
        assert!(matches!(
            ExecutionSettings::builder().max_tokens(0).build(),
            Err(LlmError::InvalidParameter(_))
        ));
        assert!(matches!(
            ExecutionSettings::builder().presence_penalty(-2.5).build(),
            Err(LlmError::InvalidParameter(_))
        ));
    }

    #[test]
    fn deserialized_settings_are_validated() {
        let err = serde_json::from_value::<ExecutionSettings>(serde_json::json!({
            "temperature": 5.0
        }))
        .unwrap_err();
        assert!(err.to_string().contains("temperature"));

        let settings: ExecutionSettings = serde_json::from_value(serde_json::json!({
            "model_id": "qwen-max",
            "top_p": 0.8,
            "extensions": {"enable_search": true}
        }))
        .unwrap();
        assert_eq!(settings.model_id(), Some("qwen-max"));
        assert_eq!(settings.top_p(), Some(0.8));
        assert_eq!(settings.extension("enable_search"), Some(&serde_json::json!(true)));

        let round_trip: ExecutionSettings =
            serde_json::from_str(&serde_json::to_string(&settings).unwrap()).unwrap();
        assert_eq!(round_trip, settings);
    }

    #[test]
    fn model_or_prefers_explicit_model() {
        let settings = ExecutionSettings::default();
        assert_eq!(settings.model_or("qwen-max"), "qwen-max");
        let settings = ExecutionSettings::builder().model_id("qwen-turbo").build().unwrap();
        assert_eq!(settings.model_or("qwen-max"), "qwen-turbo");
    }
}
