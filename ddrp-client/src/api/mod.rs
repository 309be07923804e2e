//! Backend API client
//!
//! One [`BackendClient`] covers every REST endpoint the dashboard consumes.
//! Endpoint groups live in their own modules as `impl BackendClient` blocks.

use ddrp_core::{ApiConfig, DdrpError, DdrpResult, ErrorContext};
use log::debug;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

mod auth;
mod invoices;
mod materials;
mod orders;

#[cfg(test)]
mod tests;

/// Configuration for the backend client
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
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout_seconds: config.timeout_seconds,
            user_agent: config.user_agent.clone(),
            headers: HashMap::new(),
        }
    }
}

impl ApiClientConfig {
    /// Configuration pointing at `base_url` with default settings otherwise
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
}

/// Client for the order/invoice/inventory backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    config: ApiClientConfig,
}

impl BackendClient {
    /// Create a new backend client
    pub fn new(config: ApiClientConfig) -> DdrpResult<Self> {
        let client = create_http_client(&config)?;

        debug!("Created backend client for {}", config.base_url);

        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Absolute URL for an endpoint path
    pub(crate) fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Start a request, attaching the bearer credential when one is given
    pub(crate) fn request(
        &self,
        method: Method,
        endpoint: &str,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let url = self.endpoint_url(endpoint);
        debug!("{} {}", method, url);

        let builder = self.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and turn transport failures and non-success statuses into errors
    pub(crate) async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        operation: &str,
    ) -> DdrpResult<reqwest::Response> {
        let response = builder.send().await.map_err(|e| DdrpError::Network {
            message: format!("Request to backend failed: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("backend_client")
                .with_operation(operation)
                .with_suggestion("Check network connectivity and the configured API URL"),
        })?;

        if !response.status().is_success() {
            return Err(handle_response_error(response, operation).await);
        }

        Ok(response)
    }

    /// Send a request and decode a JSON body
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        operation: &str,
    ) -> DdrpResult<T> {
        let response = self.send(builder, operation).await?;

        response.json::<T>().await.map_err(|e| DdrpError::Internal {
            message: format!("Failed to parse backend response: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("backend_client").with_operation(operation),
        })
    }

    /// Send a request whose body may be empty or free-form JSON
    pub(crate) async fn send_value(
        &self,
        builder: reqwest::RequestBuilder,
        operation: &str,
    ) -> DdrpResult<serde_json::Value> {
        let response = self.send(builder, operation).await?;
        let body = response.text().await.map_err(|e| DdrpError::Network {
            message: format!("Failed to read backend response: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("backend_client").with_operation(operation),
        })?;

        Ok(parse_loose_json(&body))
    }
}

/// Encode one path segment
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Body as JSON, `Null` when empty, a JSON string when not JSON at all
pub(crate) fn parse_loose_json(body: &str) -> serde_json::Value {
    if body.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(body.to_string()))
}

/// Extract the `detail` message of an error body
///
/// Plain string details are returned as-is. Structured validation details
/// are flattened to their `msg` entries.
pub(crate) fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(detail) => Some(detail.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Helper function to create HTTP client with common configuration
pub(crate) fn create_http_client(config: &ApiClientConfig) -> DdrpResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();

    // Add user agent
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
            DdrpError::Config {
                message: format!("Invalid user agent: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?,
    );

    // Add custom headers
    for (key, value) in &config.headers {
        let header_name = reqwest::header::HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            DdrpError::Config {
                message: format!("Invalid header name '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?;

        let header_value =
            reqwest::header::HeaderValue::from_str(value).map_err(|e| DdrpError::Config {
                message: format!("Invalid header value for '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            })?;

        headers.insert(header_name, header_value);
    }

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .default_headers(headers)
        .build()
        .map_err(|e| DdrpError::Internal {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })?;

    Ok(client)
}

/// Helper function to handle HTTP response errors
pub(crate) async fn handle_response_error(response: reqwest::Response, context: &str) -> DdrpError {
    let status = response.status();
    let url = response.url().clone();

    let error_body = response.text().await.unwrap_or_default();
    let detail = extract_detail(&error_body);

    DdrpError::Backend {
        status: status.as_u16(),
        message: format!(
            "HTTP {} for {}: {}",
            status.as_u16(),
            url,
            match (&detail, error_body.is_empty()) {
                (Some(detail), _) => detail.as_str(),
                (None, false) => error_body.as_str(),
                (None, true) => status.canonical_reason().unwrap_or("Unknown error"),
            }
        ),
        detail,
        context: ErrorContext::new("backend_client")
            .with_operation(context)
            .with_suggestion(match status.as_u16() {
                401 => "Log in again",
                403 => "This action requires an admin account",
                404 => "The record may have been deleted",
                _ => "Check network connectivity and API status",
            }),
    }
}
