//! JSON-RPC 2.0 types and parsing.
//!
//! # JSON-RPC 2.0 Compliance
//!
//! - Requests have `id`, `method`, and optional `params`
//! - Notifications are requests without `id`
//! - Batches are arrays of requests/notifications
//! - `id` type (string or integer) MUST be preserved in responses
//!
//! # Security Note
//!
//! This module parses untrusted input. The body size limit is enforced at
//! the HTTP layer (see server.rs).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::error::jsonrpc::JsonRpcError;

// ============================================================================
// Fast Correlation ID Generator
// ============================================================================

/// Startup prefix derived from a single Uuid::new_v4() call.
static CORRELATION_PREFIX: LazyLock<u64> = LazyLock::new(|| {
    let seed = Uuid::new_v4().as_u128();
    (seed >> 64) as u64
});

static CORRELATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a correlation ID from a process-unique prefix and a counter.
///
/// The result has correct v4 version and RFC 4122 variant bits set, so it
/// looks like any other UUID in the logs.
pub fn fast_correlation_id() -> Uuid {
    let prefix = *CORRELATION_PREFIX;
    let counter = CORRELATION_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut combined = ((prefix as u128) << 64) | (counter as u128);
    // Version 4 (bits 48-51)
    combined = (combined & !(0xF_u128 << 76)) | (0x4_u128 << 76);
    // Variant 1, RFC 4122 (bits 64-65)
    combined = (combined & !(0x3_u128 << 62)) | (0x2_u128 << 62);
    Uuid::from_u128(combined)
}

// ============================================================================
// MCP Catalog Types
// ============================================================================

/// Tool entry as returned by `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema for the tool's input parameters
    pub input_schema: Value,
}

// ============================================================================
// Request / Response
// ============================================================================

/// JSON-RPC 2.0 request ID.
///
/// The type the client chose is echoed back unchanged: `"id": 1` is
/// answered with `"id": 1`, never `"id": "1"`.
///
/// `Null` is an explicit `"id": null`, which is distinct from a missing
/// `id` (a notification).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JsonRpcId {
    Number(i64),
    String(String),
    Null,
}

impl Serialize for JsonRpcId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            JsonRpcId::Number(n) => serializer.serialize_i64(*n),
            JsonRpcId::String(s) => serializer.serialize_str(s),
            JsonRpcId::Null => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for JsonRpcId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Number(n) => n.as_i64().map(JsonRpcId::Number).ok_or_else(|| {
                serde::de::Error::custom("JSON-RPC ID must be integer, not float")
            }),
            Value::String(s) => Ok(JsonRpcId::String(s)),
            Value::Null => Ok(JsonRpcId::Null),
            _ => Err(serde::de::Error::custom(
                "JSON-RPC ID must be string, integer, or null",
            )),
        }
    }
}

impl std::fmt::Display for JsonRpcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonRpcId::Number(n) => write!(f, "{n}"),
            JsonRpcId::String(s) => write!(f, "{s}"),
            JsonRpcId::Null => write!(f, "null"),
        }
    }
}

/// Distinguishes a missing field from an explicit null.
#[derive(Debug, Clone, Default)]
enum MaybeNull<T> {
    #[default]
    Absent,
    Null,
    Present(T),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for MaybeNull<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        if value.is_null() {
            Ok(MaybeNull::Null)
        } else {
            T::deserialize(value)
                .map(MaybeNull::Present)
                .map_err(serde::de::Error::custom)
        }
    }
}

/// Explicit null becomes `Some(JsonRpcId::Null)`; absence stays `None`.
fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<JsonRpcId>, D::Error>
where
    D: Deserializer<'de>,
{
    match MaybeNull::deserialize(deserializer)? {
        MaybeNull::Absent => Ok(None),
        MaybeNull::Null => Ok(Some(JsonRpcId::Null)),
        MaybeNull::Present(id) => Ok(Some(id)),
    }
}

/// Wire format before validation. Every field is optional so that a
/// malformed request can still be answered with a precise error.
#[derive(Debug, Clone, Deserialize)]
struct RawJsonRpcRequest {
    jsonrpc: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    id: Option<JsonRpcId>,
    method: Option<String>,
    params: Option<Value>,
}

const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 response.
///
/// `id` always serializes: `None` becomes `"id": null`, which is what the
/// protocol demands when the request id could not be determined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: Cow<'static, str>,
    pub id: Option<JsonRpcId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<JsonRpcId>, result: Value) -> Self {
        Self {
            jsonrpc: Cow::Borrowed(JSONRPC_VERSION),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response. Pass `None` when the request id is unknown.
    pub fn error(id: Option<JsonRpcId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: Cow::Borrowed(JSONRPC_VERSION),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Parsed and validated MCP request with tracking metadata.
#[derive(Clone)]
pub struct McpRequest {
    /// Original JSON-RPC ID (None for notifications)
    pub id: Option<JsonRpcId>,
    pub method: String,
    /// Method parameters (Arc-wrapped for O(1) clone)
    pub params: Option<Arc<Value>>,
    pub received_at: Instant,
    /// Unique correlation ID for tracing
    pub correlation_id: Uuid,
}

/// Params are redacted: tool arguments carry the caller's access token.
impl std::fmt::Debug for McpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpRequest")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("params", &self.params.as_ref().map(|_| "<redacted>"))
            .field("correlation_id", &self.correlation_id)
            .finish()
    }
}

impl McpRequest {
    /// Notifications do not receive responses.
    #[inline]
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Borrow a top-level member of `params`.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.as_deref().and_then(|p| p.get(key))
    }
}

/// A single item in a batch request, either valid or invalid.
#[derive(Debug)]
pub enum BatchItem {
    Valid(McpRequest),
    Invalid {
        /// The request ID if it could be extracted from the malformed item
        id: Option<JsonRpcId>,
        error: GatewayError,
    },
}

#[derive(Debug)]
pub enum ParsedRequests {
    Single(McpRequest),
    /// May contain a mix of valid and invalid items
    Batch(Vec<BatchItem>),
}

/// Parse JSON bytes into JSON-RPC 2.0 request(s).
///
/// # Errors
///
/// * `GatewayError::ParseError` - malformed JSON (-32700)
/// * `GatewayError::InvalidRequest` - valid JSON that is not a JSON-RPC
///   request, or an empty batch (-32600)
pub fn parse_jsonrpc(bytes: &[u8]) -> Result<ParsedRequests, GatewayError> {
    // Peek at the first non-whitespace byte to pick single vs batch without
    // an intermediate Value for the common case.
    let first_byte = bytes
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .ok_or_else(|| GatewayError::ParseError {
            details: "empty input".to_string(),
        })?;

    match first_byte {
        b'{' => {
            let raw: RawJsonRpcRequest = serde_json::from_slice(bytes).map_err(|e| {
                // Syntax errors are bad JSON; anything else (e.g. a float id)
                // is valid JSON with a bad shape.
                if e.is_syntax() || e.is_eof() {
                    GatewayError::ParseError {
                        details: e.to_string(),
                    }
                } else {
                    GatewayError::InvalidRequest {
                        details: e.to_string(),
                    }
                }
            })?;
            Ok(ParsedRequests::Single(parse_single_from_raw(raw)?))
        }
        b'[' => {
            let arr: Vec<Value> =
                serde_json::from_slice(bytes).map_err(|e| GatewayError::ParseError {
                    details: e.to_string(),
                })?;

            if arr.is_empty() {
                return Err(GatewayError::InvalidRequest {
                    details: "Empty batch is not allowed".to_string(),
                });
            }

            let items = arr
                .into_iter()
                .map(|item| {
                    let id = item
                        .as_object()
                        .and_then(|obj| obj.get("id"))
                        .and_then(|v| match v {
                            Value::Number(n) => n.as_i64().map(JsonRpcId::Number),
                            Value::String(s) => Some(JsonRpcId::String(s.clone())),
                            Value::Null => Some(JsonRpcId::Null),
                            _ => None,
                        });

                    match parse_single_request(item) {
                        Ok(request) => BatchItem::Valid(request),
                        Err(error) => BatchItem::Invalid { id, error },
                    }
                })
                .collect();
            Ok(ParsedRequests::Batch(items))
        }
        _ => serde_json::from_slice::<Value>(bytes)
            .map_err(|e| GatewayError::ParseError {
                details: e.to_string(),
            })
            .and_then(|_| {
                Err(GatewayError::InvalidRequest {
                    details: "Request must be an object or array".to_string(),
                })
            }),
    }
}

fn parse_single_request(value: Value) -> Result<McpRequest, GatewayError> {
    let raw: RawJsonRpcRequest =
        serde_json::from_value(value).map_err(|e| GatewayError::InvalidRequest {
            details: e.to_string(),
        })?;
    parse_single_from_raw(raw)
}

fn parse_single_from_raw(raw: RawJsonRpcRequest) -> Result<McpRequest, GatewayError> {
    match raw.jsonrpc.as_deref() {
        Some(JSONRPC_VERSION) => {}
        Some(v) => {
            return Err(GatewayError::InvalidRequest {
                details: format!("Invalid jsonrpc version: expected \"2.0\", got \"{v}\""),
            });
        }
        None => {
            return Err(GatewayError::InvalidRequest {
                details: "Missing required field: jsonrpc".to_string(),
            });
        }
    }

    let method = raw.method.ok_or_else(|| GatewayError::InvalidRequest {
        details: "Missing required field: method".to_string(),
    })?;

    Ok(McpRequest {
        id: raw.id,
        method,
        params: raw.params.map(Arc::new),
        received_at: Instant::now(),
        correlation_id: fast_correlation_id(),
    })
}
