//! `reqwest::Client` construction.

use super::HttpConfig;
use crate::error::LlmError;

/// Build a client honouring timeouts, proxy, user agent and default headers.
pub fn build_http_client_from_config(config: &HttpConfig) -> Result<reqwest::Client, LlmError> {
    let mut builder = reqwest::Client::builder();

    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(connect_timeout) = config.connect_timeout {
        builder = builder.connect_timeout(connect_timeout);
    }
    if let Some(proxy_url) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| LlmError::ConfigurationError(format!("Invalid proxy URL: {e}")))?;
        builder = builder.proxy(proxy);
    }
    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent);
    }
    if !config.headers.is_empty() {
        let mut headers = reqwest::header::HeaderMap::new();
        crate::auth::extend_headers(&mut headers, &config.headers)?;
        builder = builder.default_headers(headers);
    }

    builder
        .build()
        .map_err(|e| LlmError::HttpError(format!("Failed to create HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds() {
        assert!(build_http_client_from_config(&HttpConfig::default()).is_ok());
    }

    #[test]
    fn invalid_proxy_is_a_configuration_error() {
        let config = HttpConfig {
            proxy: Some("::not a url::".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            build_http_client_from_config(&config),
            Err(LlmError::ConfigurationError(_))
        ));
    }
}
