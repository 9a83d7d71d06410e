//! Error types for the gateway.
//!
//! Two layers of failure exist and they never mix:
//!
//! - [`GatewayError`] covers protocol faults (bad JSON, unknown RPC method,
//!   overload). These become JSON-RPC error objects.
//! - [`ToolError`] (and the [`UpstreamError`] it wraps) covers everything
//!   that can go wrong inside a tool call. These are rendered into a
//!   result envelope with `isError: true` and never reach the RPC layer.

pub mod jsonrpc;
pub mod tool;

pub use tool::{FieldViolation, ToolError, UpstreamError};

use jsonrpc::{ErrorData, JsonRpcError};
use thiserror::Error;

/// Protocol-level errors surfaced as JSON-RPC error responses.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GatewayError {
    /// Request body is not valid JSON.
    #[error("Invalid JSON: {details}")]
    ParseError { details: String },

    /// Body is JSON but not a valid JSON-RPC 2.0 message.
    #[error("Invalid JSON-RPC request: {details}")]
    InvalidRequest { details: String },

    /// The RPC method is not served by this gateway.
    #[error("Method '{method}' not found")]
    MethodNotFound { method: String },

    /// The RPC method exists but its params are malformed.
    #[error("Invalid parameters: {details}")]
    InvalidParams { details: String },

    /// Startup configuration could not be applied.
    #[error("Invalid configuration: {details}")]
    Configuration { details: String },

    /// Concurrency limit reached.
    #[error("Service temporarily unavailable")]
    ServiceUnavailable { reason: String },

    /// Something that should not happen, e.g. a result failing to serialize.
    #[error("Internal error. Reference: {correlation_id}")]
    InternalError { correlation_id: String },
}

impl GatewayError {
    /// Maps the error onto a JSON-RPC 2.0 error code.
    pub fn to_jsonrpc_code(&self) -> i32 {
        match self {
            Self::ParseError { .. } => -32700,
            Self::InvalidRequest { .. } => -32600,
            Self::MethodNotFound { .. } => -32601,
            Self::InvalidParams { .. } => -32602,
            Self::Configuration { .. } | Self::InternalError { .. } => -32603,
            Self::ServiceUnavailable { .. } => -32013,
        }
    }

    /// Stable snake_case name used in logs and in `error.data.error_type`.
    pub fn error_type_name(&self) -> &'static str {
        match self {
            Self::ParseError { .. } => "parse_error",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::MethodNotFound { .. } => "method_not_found",
            Self::InvalidParams { .. } => "invalid_params",
            Self::Configuration { .. } => "configuration_error",
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::InternalError { .. } => "internal_error",
        }
    }

    /// Extra details that are safe to return to the client.
    pub fn safe_details(&self) -> Option<serde_json::Value> {
        match self {
            Self::MethodNotFound { method } => Some(serde_json::json!({ "method": method })),
            Self::InvalidParams { details } => Some(serde_json::json!({ "reason": details })),
            // Reason strings for overload/internal failures stay in the logs.
            _ => None,
        }
    }

    /// Converts the error into the JSON-RPC error object sent on the wire.
    pub fn to_jsonrpc_error(&self, correlation_id: &str) -> JsonRpcError {
        JsonRpcError {
            code: self.to_jsonrpc_code(),
            message: self.to_string(),
            data: Some(ErrorData {
                correlation_id: correlation_id.to_string(),
                error_type: self.error_type_name().to_string(),
                details: self.safe_details(),
            }),
        }
    }
}
