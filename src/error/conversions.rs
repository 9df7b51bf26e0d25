//! Conversions from third-party error types.

use super::LlmError;

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if let Some(status) = err.status() {
            return Self::api_error(status.as_u16(), err.to_string());
        }
        Self::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for LlmError {
    fn from(err: std::io::Error) -> Self {
        Self::StreamError(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for LlmError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocketError(err.to_string())
    }
}
