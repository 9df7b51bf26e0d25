//! Response metadata attached to every returned message

use serde::{Deserialize, Serialize};

/// Metadata reported by the vendor for one response.
///
/// Fields a vendor does not report stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<chrono::DateTime<chrono::Utc>>,
    /// Vendor request id (HunYuan `RequestId`, DashScope `request_id`, Spark `sid`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Finish reason string exactly as sent by the vendor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_finish_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
    /// Anthropic: the stop sequence that ended generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequence: Option<String>,
    /// Search/citation payloads (QianFan `search_info`, HunYuan `SearchInfo`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_info: Option<serde_json::Value>,
}

impl ResponseMetadata {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    /// Set `created` from unix seconds.
    pub fn with_created_unix(mut self, secs: Option<i64>) -> Self {
        self.created = secs.and_then(|s| chrono::DateTime::from_timestamp(s, 0));
        self
    }
}
