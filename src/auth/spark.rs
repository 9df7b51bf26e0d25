//! iFlytek SparkDesk WebSocket URL signing.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};

use super::signing::hmac_sha256;
use crate::error::LlmError;

#[derive(Clone)]
pub struct SparkCredentials {
    pub app_id: String,
    pub api_key: String,
    pub api_secret: SecretString,
}

impl SparkCredentials {
    pub fn new(
        app_id: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
        }
    }
}

impl std::fmt::Debug for SparkCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparkCredentials")
            .field("app_id", &self.app_id)
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .finish()
    }
}

/// RFC 1123 date as used in the signature (`Tue, 14 Nov 2023 22:13:20 GMT`).
pub fn rfc1123(date: chrono::DateTime<chrono::Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Base64 `authorization` query value for `GET <path>` on `host` at `date`.
pub fn authorization(
    credentials: &SparkCredentials,
    host: &str,
    path: &str,
    date: &str,
) -> Result<String, LlmError> {
    let origin = format!("host: {host}\ndate: {date}\nGET {path} HTTP/1.1");
    let digest = hmac_sha256(
        credentials.api_secret.expose_secret().as_bytes(),
        origin.as_bytes(),
    )?;
    let signature = STANDARD.encode(digest);
    let authorization_origin = format!(
        r#"api_key="{}", algorithm="hmac-sha256", headers="host date request-line", signature="{signature}""#,
        credentials.api_key
    );
    Ok(STANDARD.encode(authorization_origin))
}

/// Full signed URL: `<ws_url>?authorization=..&date=..&host=..`.
pub fn signed_url(
    credentials: &SparkCredentials,
    ws_url: &str,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<String, LlmError> {
    let (host, path) = split_ws_url(ws_url)?;
    let date = rfc1123(now);
    let auth = authorization(credentials, host, path, &date)?;
    Ok(format!(
        "{ws_url}?authorization={}&date={}&host={}",
        urlencoding::encode(&auth),
        urlencoding::encode(&date),
        urlencoding::encode(host)
    ))
}

fn split_ws_url(ws_url: &str) -> Result<(&str, &str), LlmError> {
    let rest = ws_url
        .strip_prefix("wss://")
        .or_else(|| ws_url.strip_prefix("ws://"))
        .ok_or_else(|| {
            LlmError::ConfigurationError(format!("SparkDesk URL must be ws:// or wss://: {ws_url}"))
        })?;
    match rest.find('/') {
        Some(idx) => Ok((&rest[..idx], &rest[idx..])),
        None => Ok((rest, "/")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn creds() -> SparkCredentials {
        SparkCredentials::new("app", "SPARKKEY", "SPARKSECRET")
    }

    #[test]
    fn rfc1123_format() {
        let date = chrono::Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap();
        assert_eq!(rfc1123(date), "Tue, 14 Nov 2023 22:13:20 GMT");
    }

    #[test]
    fn golden_authorization() {
        let auth = authorization(
            &creds(),
            "spark-api.xf-yun.com",
            "/v3.5/chat",
            "Tue, 14 Nov 2023 22:13:20 GMT",
        )
        .unwrap();
        assert_eq!(
            auth,
            "YXBpX2tleT0iU1BBUktLRVkiLCBhbGdvcml0aG09ImhtYWMtc2hhMjU2IiwgaGVhZGVycz0iaG9zdCBkYXRlIHJlcXVlc3QtbGluZSIsIHNpZ25hdHVyZT0iNmlBZ1FQdW9YTE9NTm4zZ0tueEJhUEpHMDFJQUxUSlM3VzJEd3V3VXRFaz0i"
        );
    }

    #[test]
    fn signed_url_carries_encoded_parameters() {
        let date = chrono::Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap();
        let url = signed_url(&creds(), "wss://spark-api.xf-yun.com/v3.5/chat", date).unwrap();
        assert!(url.starts_with("wss://spark-api.xf-yun.com/v3.5/chat?authorization="));
        assert!(url.contains("&date=Tue%2C%2014%20Nov%202023%2022%3A13%3A20%20GMT"));
        assert!(url.ends_with("&host=spark-api.xf-yun.com"));
    }

    #[test]
    fn rejects_http_urls() {
        let now = chrono::Utc::now();
        assert!(signed_url(&creds(), "https://spark-api.xf-yun.com/v3.5/chat", now).is_err());
    }
}
