//! Request sending and response decoding.
//!
//! Non-success statuses become [`LlmError::ApiError`] with the raw body in
//! `details`; bodies that do not match the expected DTO become
//! [`LlmError::ResponseFormatError`] carrying the body.
//!
//! Transport errors are reported without the request URL: Gemini and QianFan
//! carry credentials in the query string.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::error::LlmError;

async fn send(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, LlmError> {
    let response = request
        .send()
        .await
        .map_err(|e| {
            LlmError::HttpError(format!("{provider} request failed: {}", e.without_url()))
        })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(provider, status = status.as_u16(), "request rejected");
    let details = serde_json::from_str::<serde_json::Value>(&body)
        .unwrap_or(serde_json::Value::String(body));
    Err(LlmError::ApiError {
        code: status.as_u16(),
        message: format!(
            "{provider} returned {}",
            status.canonical_reason().unwrap_or("an error status")
        ),
        details: Some(details),
    })
}

/// POST a JSON body and return the successful response body as text.
pub async fn post_json(
    http: &reqwest::Client,
    provider: &str,
    url: &str,
    headers: HeaderMap,
    body: &serde_json::Value,
) -> Result<String, LlmError> {
    tracing::debug!(provider, url, "sending request");
    let response = send(provider, http.post(url).headers(headers).json(body)).await?;
    read_body(provider, response).await
}

/// POST a JSON body and return the response for incremental reading.
pub async fn post_stream(
    http: &reqwest::Client,
    provider: &str,
    url: &str,
    headers: HeaderMap,
    body: &serde_json::Value,
) -> Result<reqwest::Response, LlmError> {
    tracing::debug!(provider, url, "opening stream");
    send(provider, http.post(url).headers(headers).json(body)).await
}

/// POST a JSON body with credentials in the query string. The query is kept
/// out of the logged URL.
pub(crate) async fn post_with_query(
    http: &reqwest::Client,
    provider: &str,
    url: &str,
    headers: HeaderMap,
    query: &[(&str, &str)],
    body: &serde_json::Value,
) -> Result<reqwest::Response, LlmError> {
    tracing::debug!(provider, url, "sending request");
    send(provider, http.post(url).headers(headers).query(query).json(body)).await
}

/// POST a pre-serialized body (signed connectors sign the exact bytes sent).
pub(crate) async fn post_raw(
    http: &reqwest::Client,
    provider: &str,
    url: &str,
    headers: HeaderMap,
    body: String,
) -> Result<reqwest::Response, LlmError> {
    tracing::debug!(provider, url, "sending signed request");
    send(provider, http.post(url).headers(headers).body(body)).await
}

/// POST a form body and return the response body.
pub(crate) async fn post_form(
    http: &reqwest::Client,
    provider: &str,
    url: &str,
    form: &[(&str, String)],
) -> Result<String, LlmError> {
    tracing::debug!(provider, url, "sending form request");
    let response = send(provider, http.post(url).form(form)).await?;
    read_body(provider, response).await
}

pub async fn read_body(provider: &str, response: reqwest::Response) -> Result<String, LlmError> {
    response
        .text()
        .await
        .map_err(|e| {
            LlmError::HttpError(format!("{provider} body read failed: {}", e.without_url()))
        })
}

/// Body chunks of a streaming response, with the URL stripped from errors.
pub fn body_stream(
    response: reqwest::Response,
) -> impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static {
    response
        .bytes_stream()
        .map(|chunk| chunk.map_err(reqwest::Error::without_url))
}

/// Deserialize `body` into a vendor DTO, attaching the body on failure.
pub fn decode_json<T: DeserializeOwned>(provider: &str, body: &str) -> Result<T, LlmError> {
    serde_json::from_str(body).map_err(|e| LlmError::response_format(provider, e, body))
}
