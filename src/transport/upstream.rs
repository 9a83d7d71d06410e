//! Authenticated client for the SAP Commerce OCC REST API.
//!
//! Every tool call that reaches the commerce backend goes through
//! [`UpstreamClient::call`]. The client attaches the caller's bearer token,
//! performs exactly one attempt and folds every failure into an
//! [`UpstreamError`].
//!
//! # Connection Pooling
//!
//! reqwest keeps idle connections per host, so consecutive tool calls from
//! the same agent reuse the TLS session to the commerce tenant.
//!
//! # Error Classification
//!
//! - non-2xx status → `Http { status, body }` with the raw body text
//! - timeout → `Timeout`
//! - connection refused / DNS / TLS handshake → `Connect`
//! - anything else on the wire → `Transport`
//! - 2xx with a body that is not JSON → `Decode`

use std::time::Duration;

use reqwest::{Client, Method, Url};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::context::Credential;
use crate::error::{GatewayError, UpstreamError};

/// Commerce tenant used when `COMMERCE_API_BASE` is not set.
pub const DEFAULT_COMMERCE_API_BASE: &str =
    "https://api.c90spw6e32-arganollc1-d1-public.model-t.cc.commerce.ondemand.com/occ/v2";

const USER_AGENT: &str = "sap-commerce-mcp/1.0";

/// Configuration for the upstream client.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// OCC v2 base URL, e.g. `https://host/occ/v2`
    pub base_url: String,
    /// Request timeout (includes connection + response)
    pub timeout: Duration,
    /// Connection timeout (TCP + TLS handshake)
    pub connect_timeout: Duration,
    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,
    /// Idle connection timeout
    pub pool_idle_timeout: Duration,
    /// Skip TLS certificate verification. Development tenants only.
    pub accept_invalid_certs: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_COMMERCE_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            pool_max_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            accept_invalid_certs: false,
        }
    }
}

impl UpstreamConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `COMMERCE_API_BASE`: OCC base URL (default: the public demo tenant)
    /// - `COMMERCE_API_TIMEOUT_SECS` (default: 30)
    /// - `COMMERCE_API_CONNECT_TIMEOUT_SECS` (default: 5)
    /// - `COMMERCE_API_ACCEPT_INVALID_CERTS` (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = std::env::var("COMMERCE_API_BASE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.base_url);

        let timeout_secs = env_parse("COMMERCE_API_TIMEOUT_SECS", defaults.timeout.as_secs());
        let connect_timeout_secs = env_parse(
            "COMMERCE_API_CONNECT_TIMEOUT_SECS",
            defaults.connect_timeout.as_secs(),
        );
        let accept_invalid_certs = env_parse("COMMERCE_API_ACCEPT_INVALID_CERTS", false);

        Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            accept_invalid_certs,
            ..defaults
        }
    }

    /// Create a new config with the specified base URL.
    ///
    /// Uses default values for all other settings.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Parses an env var, logging and falling back to `default` on garbage.
pub(crate) fn env_parse<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    variable = name,
                    value = %raw,
                    default = %default,
                    "Invalid environment value, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

/// A single call against the commerce API.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub credential: Credential,
    /// JSON body. Ignored for GET.
    pub body: Option<Value>,
    /// Request id for log correlation
    pub correlation_id: String,
}

impl UpstreamRequest {
    pub fn new(method: Method, url: Url, credential: Credential) -> Self {
        Self {
            method,
            url,
            credential,
            body: None,
            correlation_id: String::new(),
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }
}

/// Commerce API client.
///
/// `Clone` is cheap; the underlying reqwest client shares its pool.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    /// Create a new upstream client.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Configuration` if the client cannot be built.
    pub fn new(config: UpstreamConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .tcp_nodelay(true)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| GatewayError::Configuration {
                details: format!("cannot build commerce API client: {e}"),
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    /// Perform one authenticated call and return the decoded JSON body.
    ///
    /// An empty 2xx body yields `Value::Null`.
    pub async fn call(&self, request: UpstreamRequest) -> Result<Value, UpstreamError> {
        let UpstreamRequest {
            method,
            url,
            credential,
            body,
            correlation_id,
        } = request;

        debug!(
            correlation_id = %correlation_id,
            method = %method,
            path = %url.path(),
            "Calling commerce API"
        );

        let mut builder = self
            .client
            .request(method.clone(), url)
            .bearer_auth(credential.expose())
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(body) = body.filter(|_| method != Method::GET) {
            builder = builder.json(&body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.classify_error(e, &correlation_id))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                correlation_id = %correlation_id,
                status = status.as_u16(),
                "Commerce API returned error status"
            );
            return Err(UpstreamError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.classify_error(e, &correlation_id))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            debug!(correlation_id = %correlation_id, "Commerce API returned empty body");
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            error!(
                correlation_id = %correlation_id,
                error = %e,
                "Failed to parse commerce API response"
            );
            UpstreamError::Decode {
                reason: e.to_string(),
            }
        })
    }

    /// Classify a reqwest error into an `UpstreamError`.
    fn classify_error(&self, error: reqwest::Error, correlation_id: &str) -> UpstreamError {
        if error.is_timeout() {
            warn!(
                correlation_id = %correlation_id,
                timeout_secs = self.config.timeout.as_secs(),
                "Commerce API request timed out"
            );
            UpstreamError::Timeout {
                timeout_secs: self.config.timeout.as_secs(),
            }
        } else if error.is_connect() {
            warn!(
                correlation_id = %correlation_id,
                url = %self.config.base_url,
                "Failed to connect to commerce API"
            );
            UpstreamError::Connect {
                url: self.config.base_url.clone(),
                reason: error.to_string(),
            }
        } else {
            error!(
                correlation_id = %correlation_id,
                error = %error,
                "Commerce API request failed"
            );
            UpstreamError::Transport {
                reason: error.to_string(),
            }
        }
    }
}

/// Trait for the upstream client (enables stubbing in tests).
#[async_trait::async_trait]
pub trait UpstreamForwarder: Send + Sync {
    async fn call(&self, request: UpstreamRequest) -> Result<Value, UpstreamError>;
}

#[async_trait::async_trait]
impl UpstreamForwarder for UpstreamClient {
    async fn call(&self, request: UpstreamRequest) -> Result<Value, UpstreamError> {
        UpstreamClient::call(self, request).await
    }
}
