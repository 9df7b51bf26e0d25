//! Authentication and request signing.
//!
//! Connectors authenticate in one of these ways:
//! - static credentials in a header (`Authorization: Bearer`, `x-api-key`, `api-key`),
//! - canonical-request signing ([`tc3`] for Tencent Cloud APIs, [`volcano`] for Volcengine),
//! - a signed WebSocket URL ([`spark`]),
//! - a short-lived OAuth access token refreshed lazily ([`qianfan`]),
//! - a per-request form signature ([`youdao`]).
//!
//! The canonical-request signers share the primitives in [`signing`] but stay
//! separate types: their header sets, scopes and key chains differ.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::LlmError;

pub mod qianfan;
pub mod signing;
pub mod spark;
pub mod tc3;
pub mod volcano;
pub mod youdao;

/// Insert `name: value`, rejecting values that are not valid header text.
pub(crate) fn insert_header(
    headers: &mut HeaderMap,
    name: &str,
    value: &str,
) -> Result<(), LlmError> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| LlmError::ConfigurationError(format!("Invalid header name '{name}': {e}")))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| LlmError::ConfigurationError(format!("Invalid value for header '{name}': {e}")))?;
    headers.insert(name, value);
    Ok(())
}

/// `Authorization: Bearer <key>`.
pub(crate) fn bearer_headers(api_key: &SecretString) -> Result<HeaderMap, LlmError> {
    let mut headers = HeaderMap::new();
    let mut value = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
        .map_err(|e| LlmError::ConfigurationError(format!("Invalid API key: {e}")))?;
    value.set_sensitive(true);
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

/// A single secret header such as `x-api-key` or Azure's `api-key`.
pub(crate) fn api_key_header(name: &str, api_key: &SecretString) -> Result<HeaderMap, LlmError> {
    let mut headers = HeaderMap::new();
    insert_header(&mut headers, name, api_key.expose_secret())?;
    if let Some(v) = headers.values_mut().next() {
        v.set_sensitive(true);
    }
    Ok(headers)
}

/// Apply user-configured extra headers on top of `headers`.
pub(crate) fn extend_headers(
    headers: &mut HeaderMap,
    extra: &std::collections::HashMap<String, String>,
) -> Result<(), LlmError> {
    for (k, v) in extra {
        insert_header(headers, k, v)?;
    }
    Ok(())
}
