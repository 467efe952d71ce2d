//! Shared HTTP plumbing for the provider clients

use niche_core::{ErrorContext, NicheError, NicheResult};
use std::collections::HashMap;

/// Configuration for provider HTTP clients
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Headers sent with every request
    pub headers: HashMap<String, String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_seconds: 30,
            user_agent: concat!("niche/", env!("CARGO_PKG_VERSION")).to_string(),
            headers: HashMap::new(),
        }
    }
}

impl ApiClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set additional header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Join an endpoint path onto the base URL
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        if endpoint.is_empty() {
            return self.base_url.clone();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

/// Build a reqwest client carrying the configured default headers
pub fn create_http_client(config: &ApiClientConfig) -> NicheResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();

    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_str(&config.user_agent)
            .map_err(|e| client_setup_error(format!("Invalid user agent: {}", e), e))?,
    );

    for (key, value) in &config.headers {
        let header_name = reqwest::header::HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| client_setup_error(format!("Invalid header name '{}': {}", key, e), e))?;

        // Header values may hold credentials, keep them out of the message
        let mut header_value = reqwest::header::HeaderValue::from_str(value)
            .map_err(|e| client_setup_error(format!("Invalid header value for '{}'", key), e))?;
        header_value.set_sensitive(true);

        headers.insert(header_name, header_value);
    }

    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .default_headers(headers)
        .build()
        .map_err(|e| client_setup_error(format!("Failed to create HTTP client: {}", e), e))
}

fn client_setup_error<E>(message: String, source: E) -> NicheError
where
    E: std::error::Error + Send + Sync + 'static,
{
    NicheError::Config {
        message,
        source: Some(Box::new(source)),
        context: ErrorContext::new("http_client").with_operation("create_client"),
    }
}

/// Map a transport failure onto a network error
pub fn request_error(provider: &str, operation: &str, error: reqwest::Error) -> NicheError {
    NicheError::Network {
        message: format!("Request to {} failed: {}", provider, error),
        source: Some(Box::new(error)),
        context: ErrorContext::new(provider)
            .with_operation(operation)
            .with_suggestion("Check network connectivity and API status"),
    }
}

/// Turn a non-2xx response into a provider error carrying status and body
pub async fn handle_response_error(
    response: reqwest::Response,
    provider: &str,
    operation: &str,
) -> NicheError {
    let status = response.status();
    let error_body = response.text().await.unwrap_or_default();

    NicheError::Provider {
        provider: provider.to_string(),
        message: format!(
            "HTTP {}: {}",
            status.as_u16(),
            if error_body.is_empty() {
                status.canonical_reason().unwrap_or("Unknown error")
            } else {
                &error_body
            }
        ),
        status: Some(status.as_u16()),
        context: ErrorContext::new(provider)
            .with_operation(operation)
            .with_suggestion(status_hint(status.as_u16())),
    }
}

fn status_hint(status: u16) -> &'static str {
    match status {
        401 => "Check your API credentials",
        402 => "Check the account balance with the provider",
        403 => "Check account permissions for this endpoint",
        404 => "Check the configured base URL",
        429 => "Rate limited, retry later",
        _ => "Check network connectivity and API status",
    }
}
