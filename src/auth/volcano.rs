//! Volcengine `HMAC-SHA256` request signing (Volcano machine translation).
//!
//! Differs from [`super::tc3`]: the query string is part of the canonical
//! request, only `host` and `x-date` are signed, and the key chain is seeded
//! with the raw secret and walks `date → region → service → "request"`.

use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};

use super::insert_header;
use super::signing::{derive_key, hmac_sha256_hex, sha256_hex};
use crate::error::LlmError;

pub const ALGORITHM: &str = "HMAC-SHA256";
const SIGNED_HEADERS: &str = "host;x-date";

#[derive(Clone)]
pub struct VolcanoCredentials {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
}

impl VolcanoCredentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: SecretString::from(secret_access_key.into()),
        }
    }
}

impl std::fmt::Debug for VolcanoCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolcanoCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct VolcanoRequest<'a> {
    pub method: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    /// Unencoded query pairs; encoded and sorted during signing.
    pub query: &'a [(&'a str, &'a str)],
    pub region: &'a str,
    pub service: &'a str,
    pub body: &'a str,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolcanoSignature {
    pub x_date: String,
    pub canonical_request: String,
    pub credential_scope: String,
    pub string_to_sign: String,
    pub signature: String,
    pub authorization: String,
}

#[derive(Debug, Clone)]
pub struct VolcanoSigner {
    credentials: VolcanoCredentials,
}

impl VolcanoSigner {
    pub fn new(credentials: VolcanoCredentials) -> Self {
        Self { credentials }
    }

    /// `k=v` pairs, percent-encoded and sorted by key then value.
    pub fn canonical_query(query: &[(&str, &str)]) -> String {
        let mut pairs: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| {
                (
                    urlencoding::encode(k).into_owned(),
                    urlencoding::encode(v).into_owned(),
                )
            })
            .collect();
        pairs.sort();
        pairs
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn sign(&self, request: &VolcanoRequest<'_>) -> Result<VolcanoSignature, LlmError> {
        let x_date = request.timestamp.format("%Y%m%dT%H%M%SZ").to_string();
        let short_date = request.timestamp.format("%Y%m%d").to_string();

        let canonical_request = format!(
            "{}\n{}\n{}\nhost:{}\nx-date:{x_date}\n\n{SIGNED_HEADERS}\n{}",
            request.method.to_uppercase(),
            if request.path.is_empty() { "/" } else { request.path },
            Self::canonical_query(request.query),
            request.host,
            sha256_hex(request.body)
        );
        let credential_scope = format!(
            "{short_date}/{}/{}/request",
            request.region, request.service
        );
        let string_to_sign = format!(
            "{ALGORITHM}\n{x_date}\n{credential_scope}\n{}",
            sha256_hex(&canonical_request)
        );

        let signing_key = derive_key(
            self.credentials.secret_access_key.expose_secret().as_bytes(),
            &[&short_date, request.region, request.service, "request"],
        )?;
        let signature = hmac_sha256_hex(&signing_key, string_to_sign.as_bytes())?;
        let authorization = format!(
            "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
            self.credentials.access_key_id
        );

        Ok(VolcanoSignature {
            x_date,
            canonical_request,
            credential_scope,
            string_to_sign,
            signature,
            authorization,
        })
    }

    /// `Authorization`, `Host`, `X-Date` and `Content-Type` for a JSON call.
    pub fn headers(&self, request: &VolcanoRequest<'_>) -> Result<HeaderMap, LlmError> {
        let signed = self.sign(request)?;
        let mut headers = HeaderMap::new();
        insert_header(&mut headers, "authorization", &signed.authorization)?;
        insert_header(&mut headers, "host", request.host)?;
        insert_header(&mut headers, "x-date", &signed.x_date)?;
        insert_header(&mut headers, "content-type", "application/json")?;
        Ok(headers)
    }
}
