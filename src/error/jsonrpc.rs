//! JSON-RPC 2.0 error object as it appears on the wire.

use serde::{Deserialize, Serialize};

/// JSON-RPC 2.0 error object.
///
/// Embedded in the `error` member of a response. Only protocol-level faults
/// travel through here; tool failures are reported inside a successful
/// result envelope instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Standard (-32700..-32600) or gateway-specific (-32000..) code
    pub code: i32,

    /// Human-readable error message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ErrorData>,
}

/// Structured context attached to an error.
///
/// Every field here is safe to hand back to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorData {
    /// Identifier that ties this error to the gateway's log lines
    pub correlation_id: String,

    /// Machine-readable error type name
    pub error_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_with_data_serialization() {
        let error = JsonRpcError {
            code: -32601,
            message: "Method 'resources/list' not found".to_string(),
            data: Some(ErrorData {
                correlation_id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
                error_type: "method_not_found".to_string(),
                details: Some(serde_json::json!({ "method": "resources/list" })),
            }),
        };

        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(json["code"], -32601);
        assert_eq!(json["message"], "Method 'resources/list' not found");
        assert_eq!(
            json["data"]["correlation_id"],
            "550e8400-e29b-41d4-a716-446655440000"
        );
        assert_eq!(json["data"]["error_type"], "method_not_found");
        assert_eq!(json["data"]["details"]["method"], "resources/list");
    }

    #[test]
    fn test_absent_members_are_omitted() {
        let bare = JsonRpcError {
            code: -32700,
            message: "Parse error".to_string(),
            data: None,
        };
        assert!(!serde_json::to_string(&bare).unwrap().contains("\"data\""));

        let no_details = JsonRpcError {
            code: -32603,
            message: "Internal error".to_string(),
            data: Some(ErrorData {
                correlation_id: "c-1".to_string(),
                error_type: "internal_error".to_string(),
                details: None,
            }),
        };
        assert!(
            !serde_json::to_string(&no_details)
                .unwrap()
                .contains("\"details\"")
        );
    }

    #[test]
    fn test_roundtrip_from_wire() {
        let wire = r#"{"code":-32013,"message":"Service temporarily unavailable","data":{"correlation_id":"x","error_type":"service_unavailable"}}"#;
        let error: JsonRpcError = serde_json::from_str(wire).unwrap();
        assert_eq!(error.code, -32013);
        assert_eq!(error.data.unwrap().error_type, "service_unavailable");
    }
}
