//! Per-call execution context and credential extraction.
//!
//! MCP clients pass the commerce bearer token inside the tool arguments as
//! `params.arguments.access_token`. It is lifted out here, before routing,
//! and travels with the call in a [`CallContext`]. Nothing about it is kept
//! once the call completes.

use serde_json::Value;

use crate::transport::jsonrpc::McpRequest;

/// Argument key that carries the bearer token.
pub const ACCESS_TOKEN_ARG: &str = "access_token";

/// Bearer token presented by the MCP client.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for the `Authorization` header only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Read `params.arguments.access_token`.
///
/// Only a non-empty JSON string counts; the token format is not checked.
pub fn extract_credential(params: Option<&Value>) -> Option<Credential> {
    params?
        .get("arguments")?
        .get(ACCESS_TOKEN_ARG)?
        .as_str()
        .filter(|token| !token.is_empty())
        .map(Credential::new)
}

/// Everything a tool handler knows about the call it is serving.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub credential: Option<Credential>,
    pub correlation_id: String,
    pub session_id: String,
}

impl CallContext {
    pub fn for_request(request: &McpRequest, session_id: &str) -> Self {
        Self {
            credential: extract_credential(request.params.as_deref()),
            correlation_id: request.correlation_id.to_string(),
            session_id: session_id.to_string(),
        }
    }

    /// Context with no credential and a synthetic correlation id.
    pub fn anonymous(session_id: &str) -> Self {
        Self {
            credential: None,
            correlation_id: crate::transport::jsonrpc::fast_correlation_id().to_string(),
            session_id: session_id.to_string(),
        }
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }
}
