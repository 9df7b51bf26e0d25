//! Builder utilities shared by the connector builders.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::error::LlmError;
use crate::http::{HttpConfig, build_http_client_from_config};

/// HTTP settings every connector builder carries.
#[derive(Debug, Clone, Default)]
pub struct ProviderCore {
    pub http_config: HttpConfig,
    /// Custom client; takes precedence over `http_config`.
    pub http_client: Option<reqwest::Client>,
}

impl ProviderCore {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.http_config.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.http_config.connect_timeout = Some(timeout);
        self
    }

    pub fn http_config(mut self, config: HttpConfig) -> Self {
        self.http_config = config;
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build_http_client(&self) -> Result<reqwest::Client, LlmError> {
        match &self.http_client {
            Some(client) => Ok(client.clone()),
            None => build_http_client_from_config(&self.http_config),
        }
    }
}

/// Explicit secret first, then `env_var`. Empty values count as missing.
pub(crate) fn resolve_secret(
    explicit: Option<SecretString>,
    env_var: &str,
) -> Result<SecretString, LlmError> {
    if let Some(secret) = explicit.filter(|s| !s.expose_secret().is_empty()) {
        return Ok(secret);
    }
    match std::env::var(env_var) {
        Ok(value) if !value.is_empty() => Ok(SecretString::from(value)),
        _ => Err(LlmError::MissingApiKey(format!(
            "set it on the builder or via the {env_var} environment variable"
        ))),
    }
}

/// Like [`resolve_secret`] for identifiers that are not secret (app ids, access key ids).
pub(crate) fn resolve_value(explicit: Option<String>, env_var: &str) -> Result<String, LlmError> {
    resolve_secret(explicit.map(SecretString::from), env_var)
        .map(|s| s.expose_secret().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_secret_wins() {
        let secret = resolve_secret(
            Some(SecretString::from("explicit".to_string())),
            "KC_TEST_UNSET_VARIABLE",
        )
        .unwrap();
        assert_eq!(secret.expose_secret(), "explicit");
    }

    #[test]
    fn missing_secret_names_the_variable() {
        let err = resolve_secret(None, "KC_TEST_UNSET_VARIABLE").unwrap_err();
        match err {
            LlmError::MissingApiKey(msg) => assert!(msg.contains("KC_TEST_UNSET_VARIABLE")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn empty_explicit_secret_is_missing() {
        let err = resolve_secret(
            Some(SecretString::from(String::new())),
            "KC_TEST_UNSET_VARIABLE",
        )
        .unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey(_)));
    }

    #[test]
    fn custom_client_is_reused() {
        let core = ProviderCore::default().with_http_client(reqwest::Client::new());
        assert!(core.build_http_client().is_ok());
    }
}
