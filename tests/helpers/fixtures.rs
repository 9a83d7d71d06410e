//! JSON-RPC messages and OCC payloads used across tests.

use serde_json::{Value, json};

pub const TOKEN: &str = "occ-test-token";
pub const SITE: &str = "electronics-spa";

pub fn initialize(id: i64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-03-26",
            "capabilities": {},
            "clientInfo": {"name": "integration-test", "version": "0.0.1"}
        }
    })
}

pub fn tools_list(id: i64) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": "tools/list"})
}

pub fn tools_call(id: i64, name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    })
}

/// Merge the test bearer token into tool arguments.
pub fn authed(mut arguments: Value) -> Value {
    arguments["access_token"] = json!(TOKEN);
    arguments
}

pub fn product_page() -> Value {
    json!({
        "products": [
            {
                "code": "300938",
                "name": "Photosmart E317 Digital Camera",
                "price": {"formattedValue": "$114.12", "value": 114.12},
                "stock": {"stockLevelStatus": "inStock"}
            },
            {
                "code": "358639",
                "name": "DSC-N1",
                "price": {"formattedValue": "$411.09"}
            }
        ],
        "pagination": {"currentPage": 0, "pageSize": 5, "totalPages": 3, "totalResults": 12}
    })
}

pub fn cart() -> Value {
    json!({
        "code": "00001000",
        "totalItems": 1,
        "totalPrice": {"formattedValue": "$114.12"},
        "entries": [
            {
                "entryNumber": 0,
                "quantity": 1,
                "product": {"code": "300938", "name": "Photosmart E317 Digital Camera"},
                "totalPrice": {"formattedValue": "$114.12"}
            }
        ]
    })
}

pub fn cart_modification() -> Value {
    json!({
        "statusCode": "success",
        "quantity": 2,
        "quantityAdded": 2,
        "entry": {
            "entryNumber": 0,
            "quantity": 2,
            "product": {"code": "300938", "name": "Photosmart E317 Digital Camera"}
        }
    })
}
