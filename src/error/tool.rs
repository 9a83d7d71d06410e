//! Tool-level failures.
//!
//! None of these ever become a JSON-RPC error. The tool registry renders
//! each one into a result envelope with `isError: true`.

use thiserror::Error;

/// Failure reported by the commerce REST API or the HTTP stack below it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UpstreamError {
    /// Non-2xx status. `body` is the raw response text.
    #[error("SAP Commerce API error! status: {status}, message: {body}")]
    Http { status: u16, body: String },

    #[error("SAP Commerce API did not respond within {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Cannot connect to SAP Commerce API at {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("SAP Commerce API request failed: {reason}")]
    Transport { reason: String },

    /// 2xx status but the body was not valid JSON.
    #[error("SAP Commerce API returned a malformed response: {reason}")]
    Decode { reason: String },
}

impl UpstreamError {
    /// HTTP status of the failed call, when the API answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn error_type_name(&self) -> &'static str {
        match self {
            Self::Http { .. } => "upstream_http",
            Self::Timeout { .. } => "upstream_timeout",
            Self::Connect { .. } => "upstream_connect",
            Self::Transport { .. } => "upstream_transport",
            Self::Decode { .. } => "upstream_decode",
        }
    }
}

/// One argument that failed schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub problem: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            problem: problem.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

/// Everything that can go wrong during a single tool invocation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ToolError {
    #[error(
        "No access token provided. Please ensure your MCP client is configured to pass an access token."
    )]
    MissingCredential,

    #[error("invalid arguments: {}", join_violations(.violations))]
    Validation { violations: Vec<FieldViolation> },

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("unknown tool '{name}'")]
    UnknownTool { name: String },

    /// A handler precondition failed before any upstream call.
    #[error("{message}")]
    InvalidInput { message: String },

    /// The upstream answered 2xx but without the data the tool needs.
    #[error("{message}")]
    UnexpectedResponse { message: String },

    /// The handler panicked or otherwise failed outside its contract.
    #[error("tool handler failed unexpectedly")]
    Internal,
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ToolError {
    /// Text placed in the error envelope.
    ///
    /// Gateway-side rejections read `Error: <message>`. Failures that happen
    /// while the tool runs carry the tool's own prefix, except
    /// `UnexpectedResponse` whose message is already complete.
    pub fn render(&self, failure_prefix: &str) -> String {
        match self {
            Self::MissingCredential
            | Self::Validation { .. }
            | Self::UnknownTool { .. }
            | Self::InvalidInput { .. } => format!("Error: {self}"),
            Self::UnexpectedResponse { message } => message.clone(),
            Self::Upstream(_) | Self::Internal => format!("{failure_prefix}: {self}"),
        }
    }

    pub fn error_type_name(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::Validation { .. } => "validation",
            Self::Upstream(e) => e.error_type_name(),
            Self::UnknownTool { .. } => "unknown_tool",
            Self::InvalidInput { .. } => "invalid_input",
            Self::UnexpectedResponse { .. } => "unexpected_response",
            Self::Internal => "internal",
        }
    }
}
