//! Core error types.

use thiserror::Error;

/// Errors produced by connectors.
///
/// The variants follow the four failure classes of a vendor call:
/// input validation (before any I/O), transport, vendor-semantic rejection,
/// and response deserialization.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// Malformed input, e.g. an empty or inconsistent chat history.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A settings value outside the accepted range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// No credential was configured or found in the environment.
    #[error("Missing API key: {0}")]
    MissingApiKey(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Connection or I/O failure reported by the HTTP client.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Non-success HTTP status. `details` carries the raw body when available.
    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// The vendor answered, but the answer is a failure (safety filter,
    /// empty result, token limit, vendor error code).
    #[error("{provider} error: {message}")]
    ProviderError {
        provider: String,
        message: String,
        error_code: Option<String>,
        raw_body: Option<String>,
    },

    /// The vendor JSON did not match the expected shape.
    #[error("{provider} response could not be decoded: {message}")]
    ResponseFormatError {
        provider: String,
        message: String,
        raw_body: String,
    },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Coarse classification used for presentation and caller-side retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Configuration,
    Authentication,
    RateLimit,
    Client,
    Server,
    Network,
    Provider,
    Parsing,
    Cancelled,
    Unsupported,
    Internal,
}

impl LlmError {
    /// Create an `ApiError` without a body.
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a vendor-semantic error carrying the raw response body.
    pub fn provider(
        provider: impl Into<String>,
        message: impl Into<String>,
        error_code: Option<String>,
        raw_body: Option<String>,
    ) -> Self {
        Self::ProviderError {
            provider: provider.into(),
            message: message.into(),
            error_code,
            raw_body,
        }
    }

    /// Wrap a deserialization failure together with the body that caused it.
    pub fn response_format(
        provider: impl Into<String>,
        message: impl std::fmt::Display,
        raw_body: impl Into<String>,
    ) -> Self {
        Self::ResponseFormatError {
            provider: provider.into(),
            message: message.to_string(),
            raw_body: raw_body.into(),
        }
    }

    /// HTTP status code, when the error came from a non-success response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Raw vendor response body attached to the error, if any.
    pub fn raw_body(&self) -> Option<String> {
        match self {
            Self::ProviderError { raw_body, .. } => raw_body.clone(),
            Self::ResponseFormatError { raw_body, .. } => Some(raw_body.clone()),
            Self::ApiError { details, .. } => details.as_ref().map(|d| match d {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput(_) | Self::InvalidParameter(_) => ErrorCategory::Validation,
            Self::MissingApiKey(_) | Self::ConfigurationError(_) => ErrorCategory::Configuration,
            Self::AuthenticationError(_) => ErrorCategory::Authentication,
            Self::ApiError { code, .. } => match code {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Client,
            },
            Self::HttpError(_) | Self::WebSocketError(_) => ErrorCategory::Network,
            Self::ProviderError { .. } => ErrorCategory::Provider,
            Self::ResponseFormatError { .. } | Self::ParseError(_) | Self::StreamError(_) => {
                ErrorCategory::Parsing
            }
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::UnsupportedOperation(_) => ErrorCategory::Unsupported,
            Self::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// Whether a caller could reasonably retry. Connectors never retry themselves.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit | ErrorCategory::Server | ErrorCategory::Network
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_categories() {
        assert_eq!(
            LlmError::api_error(401, "bad signature").category(),
            ErrorCategory::Authentication
        );
        assert_eq!(LlmError::api_error(429, "slow down").category(), ErrorCategory::RateLimit);
        assert_eq!(LlmError::api_error(503, "down").category(), ErrorCategory::Server);
        assert_eq!(LlmError::api_error(404, "Not found").category(), ErrorCategory::Client);
        assert!(LlmError::api_error(502, "bad gateway").is_retryable());
        assert!(!LlmError::InvalidInput("empty history".into()).is_retryable());
    }

    #[test]
    fn raw_body_is_exposed_for_vendor_failures() {
        let err = LlmError::provider(
            "hunyuan",
            "content blocked",
            Some("FailedOperation".into()),
            Some(r#"{"Response":{}}"#.into()),
        );
        assert_eq!(err.raw_body().as_deref(), Some(r#"{"Response":{}}"#));

        let err = LlmError::response_format("gemini", "missing field", "{oops");
        assert_eq!(err.raw_body().as_deref(), Some("{oops"));
        assert_eq!(err.category(), ErrorCategory::Parsing);
    }
}
