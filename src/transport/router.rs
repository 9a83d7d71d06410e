//! MCP method routing.
//!
//! | Method | Route To |
//! |--------|----------|
//! | `initialize` | Handshake, answered locally |
//! | `ping` | Empty result |
//! | `tools/list` | Tool registry catalog |
//! | `tools/call` | Tool registry dispatch |
//! | `notifications/*` | Acknowledged, no response body |
//! | `*` (unknown) | -32601 Method not found |

use serde_json::{Value, json};

use crate::transport::jsonrpc::McpRequest;

/// Protocol revision answered when the client asks for one we don't speak.
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

/// Revisions this server can answer, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

/// Name advertised in `serverInfo`.
pub const SERVER_NAME: &str = "sap-commerce";

/// Where a request is handled. The request moves into the variant.
#[derive(Debug)]
pub enum RouteTarget {
    Initialize { request: McpRequest },
    Ping { request: McpRequest },
    ToolsList { request: McpRequest },
    ToolsCall { request: McpRequest },
    /// Client notifications (`notifications/initialized`, `notifications/cancelled`, ...).
    Notification { request: McpRequest },
    MethodNotFound { request: McpRequest },
}

impl RouteTarget {
    pub fn request(&self) -> &McpRequest {
        match self {
            Self::Initialize { request }
            | Self::Ping { request }
            | Self::ToolsList { request }
            | Self::ToolsCall { request }
            | Self::Notification { request }
            | Self::MethodNotFound { request } => request,
        }
    }
}

/// Stateless method router.
#[derive(Debug, Clone, Default)]
pub struct McpRouter;

impl McpRouter {
    pub fn new() -> Self {
        Self
    }

    pub fn route(&self, request: McpRequest) -> RouteTarget {
        match request.method.as_str() {
            "initialize" => RouteTarget::Initialize { request },
            "ping" => RouteTarget::Ping { request },
            "tools/list" => RouteTarget::ToolsList { request },
            "tools/call" => RouteTarget::ToolsCall { request },
            m if m.starts_with("notifications/") => RouteTarget::Notification { request },
            _ => RouteTarget::MethodNotFound { request },
        }
    }
}

/// Pick the protocol revision to answer `initialize` with.
///
/// The client's requested revision is echoed when supported; anything else
/// (missing, unknown, not a string) gets the latest one.
pub fn negotiate_protocol_version(requested: Option<&Value>) -> &'static str {
    requested
        .and_then(Value::as_str)
        .and_then(|v| SUPPORTED_PROTOCOL_VERSIONS.iter().copied().find(|s| *s == v))
        .unwrap_or(LATEST_PROTOCOL_VERSION)
}

/// Result object for `initialize`.
pub fn initialize_result(request: &McpRequest) -> Value {
    json!({
        "protocolVersion": negotiate_protocol_version(request.param("protocolVersion")),
        "capabilities": {
            "tools": { "listChanged": false }
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::jsonrpc::JsonRpcId;
    use std::sync::Arc;
    use std::time::Instant;
    use uuid::Uuid;

    fn make_request(method: &str) -> McpRequest {
        McpRequest {
            id: Some(JsonRpcId::Number(1)),
            method: method.to_string(),
            params: None,
            received_at: Instant::now(),
            correlation_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_route_table() {
        let router = McpRouter::new();
        assert!(matches!(router.route(make_request("initialize")), RouteTarget::Initialize { .. }));
        assert!(matches!(router.route(make_request("ping")), RouteTarget::Ping { .. }));
        assert!(matches!(router.route(make_request("tools/list")), RouteTarget::ToolsList { .. }));
        assert!(matches!(router.route(make_request("tools/call")), RouteTarget::ToolsCall { .. }));
        assert!(matches!(
            router.route(make_request("notifications/initialized")),
            RouteTarget::Notification { .. }
        ));
    }

    #[test]
    fn test_unknown_methods_not_found() {
        let router = McpRouter::new();
        for method in ["resources/list", "prompts/get", "tasks/get", "tools", ""] {
            assert!(
                matches!(router.route(make_request(method)), RouteTarget::MethodNotFound { .. }),
                "{method} should not be routed"
            );
        }
    }

    #[test]
    fn test_request_preserved_in_route_target() {
        let correlation_id = Uuid::new_v4();
        let req = McpRequest {
            id: Some(JsonRpcId::String("abc".to_string())),
            method: "tools/call".to_string(),
            params: Some(Arc::new(json!({"name": "get-cart"}))),
            received_at: Instant::now(),
            correlation_id,
        };

        let target = McpRouter::new().route(req);
        assert_eq!(target.request().correlation_id, correlation_id);
        assert_eq!(target.request().id, Some(JsonRpcId::String("abc".to_string())));
    }

    #[test]
    fn test_protocol_negotiation() {
        assert_eq!(negotiate_protocol_version(Some(&json!("2024-11-05"))), "2024-11-05");
        assert_eq!(negotiate_protocol_version(Some(&json!("2025-03-26"))), "2025-03-26");
        assert_eq!(negotiate_protocol_version(Some(&json!("1999-01-01"))), LATEST_PROTOCOL_VERSION);
        assert_eq!(negotiate_protocol_version(Some(&json!(7))), LATEST_PROTOCOL_VERSION);
        assert_eq!(negotiate_protocol_version(None), LATEST_PROTOCOL_VERSION);
    }

    #[test]
    fn test_initialize_result_shape() {
        let mut req = make_request("initialize");
        req.params = Some(Arc::new(json!({"protocolVersion": "2025-03-26", "capabilities": {}})));

        let result = initialize_result(&req);
        assert_eq!(result["protocolVersion"], "2025-03-26");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(result["serverInfo"]["name"], "sap-commerce");
        assert_eq!(result["serverInfo"]["version"], env!("CARGO_PKG_VERSION"));
    }
}
