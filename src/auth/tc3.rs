//! Tencent Cloud `TC3-HMAC-SHA256` request signing (HunYuan, Tencent Machine Translation).

use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};

use super::insert_header;
use super::signing::{derive_key, hmac_sha256_hex, sha256_hex};
use crate::error::LlmError;

pub const ALGORITHM: &str = "TC3-HMAC-SHA256";
const SIGNED_HEADERS: &str = "content-type;host;x-tc-action";
const CONTENT_TYPE: &str = "application/json";

/// Long-lived Tencent Cloud credential pair.
#[derive(Clone)]
pub struct Tc3Credentials {
    pub secret_id: String,
    pub secret_key: SecretString,
}

impl Tc3Credentials {
    pub fn new(secret_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: SecretString::from(secret_key.into()),
        }
    }
}

impl std::fmt::Debug for Tc3Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tc3Credentials")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"***")
            .finish()
    }
}

/// One API call to sign.
#[derive(Debug, Clone)]
pub struct Tc3Request<'a> {
    /// e.g. `hunyuan.tencentcloudapi.com`
    pub host: &'a str,
    /// e.g. `ChatCompletions`
    pub action: &'a str,
    /// e.g. `2023-09-01`
    pub version: &'a str,
    pub region: Option<&'a str>,
    /// Serialized JSON body, signed byte-for-byte.
    pub body: &'a str,
    /// Unix seconds.
    pub timestamp: i64,
}

/// Intermediate values, exposed for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tc3Signature {
    pub canonical_request: String,
    pub credential_scope: String,
    pub string_to_sign: String,
    pub signature: String,
    pub authorization: String,
}

/// Signer for Tencent Cloud API 3.0 calls.
#[derive(Debug, Clone)]
pub struct Tc3Signer {
    credentials: Tc3Credentials,
}

impl Tc3Signer {
    pub fn new(credentials: Tc3Credentials) -> Self {
        Self { credentials }
    }

    /// Service name: the first `.`-separated label of the host.
    pub fn service_from_host(host: &str) -> &str {
        host.split('.').next().unwrap_or(host)
    }

    pub fn canonical_request(request: &Tc3Request<'_>) -> String {
        format!(
            "POST\n/\n\ncontent-type:{CONTENT_TYPE}\nhost:{}\nx-tc-action:{}\n\n{SIGNED_HEADERS}\n{}",
            request.host,
            request.action.to_lowercase(),
            sha256_hex(request.body)
        )
    }

    pub fn sign(&self, request: &Tc3Request<'_>) -> Result<Tc3Signature, LlmError> {
        let service = Self::service_from_host(request.host);
        self.sign_canonical(Self::canonical_request(request), service, request.timestamp)
    }

    /// Scope, string to sign and signature for an already built canonical
    /// request. The scope date is the UTC `yyyy-MM-dd` of `timestamp`.
    pub fn sign_canonical(
        &self,
        canonical_request: String,
        service: &str,
        timestamp: i64,
    ) -> Result<Tc3Signature, LlmError> {
        let date = chrono::DateTime::from_timestamp(timestamp, 0)
            .ok_or_else(|| LlmError::InvalidParameter(format!("Invalid timestamp {timestamp}")))?
            .format("%Y-%m-%d")
            .to_string();

        let credential_scope = format!("{date}/{service}/tc3_request");
        let string_to_sign = format!(
            "{ALGORITHM}\n{timestamp}\n{credential_scope}\n{}",
            sha256_hex(&canonical_request)
        );

        let seed = format!("TC3{}", self.credentials.secret_key.expose_secret());
        let signing_key = derive_key(seed.as_bytes(), &[&date, service, "tc3_request"])?;
        let signature = hmac_sha256_hex(&signing_key, string_to_sign.as_bytes())?;

        let authorization = format!(
            "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
            self.credentials.secret_id
        );

        Ok(Tc3Signature {
            canonical_request,
            credential_scope,
            string_to_sign,
            signature,
            authorization,
        })
    }

    /// Headers for the signed call: `Authorization`, `Content-Type`, `Host`
    /// and the `X-TC-*` set.
    pub fn headers(&self, request: &Tc3Request<'_>) -> Result<HeaderMap, LlmError> {
        let signed = self.sign(request)?;
        let mut headers = HeaderMap::new();
        insert_header(&mut headers, "authorization", &signed.authorization)?;
        insert_header(&mut headers, "content-type", CONTENT_TYPE)?;
        insert_header(&mut headers, "host", request.host)?;
        insert_header(&mut headers, "x-tc-action", request.action)?;
        insert_header(&mut headers, "x-tc-timestamp", &request.timestamp.to_string())?;
        insert_header(&mut headers, "x-tc-version", request.version)?;
        if let Some(region) = request.region.filter(|r| !r.is_empty()) {
            insert_header(&mut headers, "x-tc-region", region)?;
        }
        Ok(headers)
    }
}
