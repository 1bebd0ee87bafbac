//! Remote catalog collaborators
//!
//! `HttpCatalogClient` speaks to the catalog REST API; `MockCatalogRemote`
//! serves the built-in catalog from memory. Both implement the
//! `Authenticator` and `CatalogRemote` contracts from `catalog-core`.

use catalog_core::{ApiConfig, CatalogConfig, CatalogError, ErrorContext, RemoteMode};
use std::collections::HashMap;
use std::sync::Arc;

pub mod decode;
pub mod http;
pub mod mock;

#[cfg(test)]
mod tests;

pub use http::HttpCatalogClient;
pub use mock::{MockCatalogRemote, MockFailure, MOCK_EMAIL, MOCK_PASSWORD, MOCK_TOKEN};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Additional headers
    pub headers: HashMap<String, String>,
    /// Honor HTTP(S)_PROXY from the environment
    pub use_env_proxy: bool,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self::from(&CatalogConfig::default().api)
    }
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(api: &ApiConfig) -> Self {
        Self {
            base_url: api.base_url.clone(),
            timeout_seconds: api.timeout_seconds,
            user_agent: api.user_agent.clone(),
            headers: HashMap::new(),
            use_env_proxy: true,
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
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Connect directly, ignoring proxy environment variables
    pub fn without_proxy(mut self) -> Self {
        self.use_env_proxy = false;
        self
    }

    /// Absolute URL for an endpoint relative to the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// The collaborator pair selected by configuration
#[derive(Clone)]
pub struct RemoteBackend {
    pub authenticator: Arc<dyn catalog_core::Authenticator>,
    pub remote: Arc<dyn catalog_core::CatalogRemote>,
}

impl RemoteBackend {
    /// Build the backend named by `api.mode`
    pub fn from_config(config: &CatalogConfig) -> catalog_core::CatalogResult<Self> {
        match config.api.mode {
            RemoteMode::Http => {
                let client = Arc::new(HttpCatalogClient::new(ApiClientConfig::from(&config.api))?);
                Ok(Self {
                    authenticator: client.clone(),
                    remote: client,
                })
            }
            RemoteMode::Mock => {
                let mock = Arc::new(MockCatalogRemote::seeded());
                Ok(Self {
                    authenticator: mock.clone(),
                    remote: mock,
                })
            }
        }
    }
}

fn client_error(message: String, source: impl std::error::Error + Send + Sync + 'static) -> CatalogError {
    CatalogError::Config {
        message,
        source: Some(Box::new(source)),
        context: ErrorContext::new("http_client").with_operation("create_client"),
    }
}

/// Helper function to create HTTP client with common configuration
pub(crate) fn create_http_client(
    config: &ApiClientConfig,
) -> catalog_core::CatalogResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();

    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_str(&config.user_agent)
            .map_err(|e| client_error(format!("Invalid user agent: {}", e), e))?,
    );
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    for (key, value) in &config.headers {
        let header_name = reqwest::header::HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| client_error(format!("Invalid header name '{}': {}", key, e), e))?;
        let header_value = reqwest::header::HeaderValue::from_str(value)
            .map_err(|e| client_error(format!("Invalid header value for '{}': {}", key, e), e))?;
        headers.insert(header_name, header_value);
    }

    let mut builder = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .default_headers(headers);
    if !config.use_env_proxy {
        builder = builder.no_proxy();
    }

    builder
        .build()
        .map_err(|e| client_error(format!("Failed to create HTTP client: {}", e), e))
}

/// Map a transport-level failure (no HTTP status) to the error taxonomy
pub(crate) fn transport_error(
    error: reqwest::Error,
    operation: &str,
    timeout_seconds: u64,
) -> CatalogError {
    if error.is_timeout() {
        return CatalogError::Timeout {
            operation: operation.to_string(),
            duration_ms: timeout_seconds.saturating_mul(1000),
            context: ErrorContext::new("api_client")
                .with_operation(operation)
                .with_suggestion("Check that the catalog API is responsive"),
        };
    }

    let suggestion = if error.is_connect() {
        "Check that the catalog API is running and api.base_url is correct"
    } else {
        "Check network connectivity and API status"
    };

    CatalogError::Network {
        message: format!("Request failed: {}", error),
        source: Some(Box::new(error)),
        context: ErrorContext::new("api_client")
            .with_operation(operation)
            .with_suggestion(suggestion),
    }
}

/// Map a non-success HTTP status and its body to the error taxonomy
pub(crate) fn status_error(status: u16, body: &str, operation: &str, resource: &str) -> CatalogError {
    let server_message = decode::server_message(body);
    let context = ErrorContext::new("api_client")
        .with_operation(operation)
        .with_metadata("status", &status.to_string());

    match status {
        401 | 403 => CatalogError::Authentication {
            message: server_message.unwrap_or_else(|| format!("HTTP {}", status)),
            context: context.with_suggestion("Sign in again"),
        },
        404 => CatalogError::NotFound {
            resource: resource.to_string(),
            context: context.with_suggestion("Reload the catalog; the product may have been removed"),
        },
        _ => CatalogError::Remote {
            message: server_message.unwrap_or_else(|| {
                reqwest::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Unknown error")
                    .to_string()
            }),
            status: Some(status),
            context: context.with_suggestion("Check network connectivity and API status"),
        },
    }
}

/// Helper function to handle HTTP response errors
pub(crate) async fn handle_response_error(
    response: reqwest::Response,
    operation: &str,
    resource: &str,
) -> CatalogError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    status_error(status, &body, operation, resource)
}
