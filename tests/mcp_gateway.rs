//! End-to-end tests: MCP JSON-RPC over the axum app, commerce calls against
//! a wiremock OCC server.

mod helpers;

use helpers::fixtures::{self, SITE, TOKEN, authed};
use helpers::{TestGateway, envelope_text, is_error};
use http::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn occ() -> (MockServer, TestGateway) {
    let server = MockServer::start().await;
    let gateway = TestGateway::new(&format!("{}/occ/v2", server.uri()));
    (server, gateway)
}

#[tokio::test]
async fn test_handshake_then_catalog() {
    let (_server, gateway) = occ().await;

    let session = gateway.initialize().await;
    assert!(gateway.sessions.contains(&session));

    let (same, reply) = gateway.rpc(&fixtures::tools_list(1), Some(session.as_str())).await;
    assert_eq!(same, session);

    let tools = reply["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(
        names,
        [
            "product-search",
            "get-base-sites",
            "order-history",
            "order-details",
            "add-to-cart",
            "get-cart",
            "update-cart-entry",
            "set-delivery-address",
            "set-delivery-mode",
            "get-delivery-modes",
            "place-order",
            "b2b-add-to-cart",
            "b2b-get-cart",
            "b2b-update-cart-entry",
            "b2b-place-order",
        ]
    );
    for tool in tools {
        assert_eq!(tool["inputSchema"]["type"], "object", "{}", tool["name"]);
        assert!(tool["description"].is_string());
    }
}

#[tokio::test]
async fn test_product_search_sends_bearer_token() {
    let (server, gateway) = occ().await;

    Mock::given(method("GET"))
        .and(path(format!("/occ/v2/{SITE}/products/search")))
        .and(query_param("query", "camera"))
        .and(query_param("pageSize", "5"))
        .and(query_param("currentPage", "0"))
        .and(query_param("fields", "DEFAULT"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::product_page()))
        .expect(1)
        .mount(&server)
        .await;

    let result = gateway
        .call_tool(
            "product-search",
            authed(json!({"baseSiteId": SITE, "query": "camera", "pageSize": 5})),
        )
        .await;

    assert!(!is_error(&result));
    let text = envelope_text(&result);
    assert!(text.starts_with("Product search results for \"camera\" in electronics-spa:"));
    assert!(text.contains("**Photosmart E317 Digital Camera** (300938)"));
    assert!(text.contains("Price: $114.12"));
}

#[tokio::test]
async fn test_whole_float_page_size_is_accepted() {
    let (server, gateway) = occ().await;

    Mock::given(method("GET"))
        .and(path(format!("/occ/v2/{SITE}/products/search")))
        .and(query_param("pageSize", "5"))
        .and(query_param("currentPage", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::product_page()))
        .expect(1)
        .mount(&server)
        .await;

    let result = gateway
        .call_tool(
            "product-search",
            authed(json!({
                "baseSiteId": SITE,
                "query": "camera",
                "pageSize": 5.0,
                "currentPage": 1.0
            })),
        )
        .await;

    assert!(!is_error(&result), "{}", envelope_text(&result));
    assert!(envelope_text(&result).contains("Photosmart E317 Digital Camera"));
}

#[tokio::test]
async fn test_product_search_no_results() {
    let (server, gateway) = occ().await;

    Mock::given(method("GET"))
        .and(path(format!("/occ/v2/{SITE}/products/search")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"products": []})))
        .mount(&server)
        .await;

    let result = gateway
        .call_tool(
            "product-search",
            authed(json!({"baseSiteId": SITE, "query": "camera", "pageSize": 5})),
        )
        .await;

    assert!(result.get("isError").is_none());
    assert_eq!(
        envelope_text(&result),
        "No products found for query \"camera\" in base site \"electronics-spa\""
    );
}

#[tokio::test]
async fn test_missing_token_never_reaches_upstream() {
    let (server, gateway) = occ().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::cart()))
        .expect(0)
        .mount(&server)
        .await;

    let result = gateway
        .call_tool(
            "get-cart",
            json!({"baseSiteId": SITE, "userId": "current", "cartId": "current"}),
        )
        .await;

    assert!(is_error(&result));
    assert!(envelope_text(&result).starts_with("Error: No access token provided."));
}

#[tokio::test]
async fn test_validation_failure_names_fields() {
    let (server, gateway) = occ().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = gateway
        .call_tool("add-to-cart", authed(json!({"baseSiteId": SITE, "quantity": "two"})))
        .await;

    assert!(is_error(&result));
    let text = envelope_text(&result);
    assert!(text.starts_with("Error: "));
    assert!(text.contains("userId"));
    assert!(text.contains("productCode"));
    assert!(text.contains("quantity"));
}

#[tokio::test]
async fn test_unknown_tool_is_error_envelope() {
    let (_server, gateway) = occ().await;

    let result = gateway.call_tool("delete-everything", authed(json!({}))).await;

    assert!(is_error(&result));
    assert!(envelope_text(&result).contains("unknown tool"));
}

#[tokio::test]
async fn test_add_to_cart_posts_entry() {
    let (server, gateway) = occ().await;

    Mock::given(method("POST"))
        .and(path(format!("/occ/v2/{SITE}/users/current/carts/current/entries")))
        .and(body_json(json!({"product": {"code": "300938"}, "quantity": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::cart_modification()))
        .expect(1)
        .mount(&server)
        .await;

    let result = gateway
        .call_tool(
            "add-to-cart",
            authed(json!({
                "baseSiteId": SITE,
                "userId": "current",
                "productCode": "300938",
                "quantity": 2
            })),
        )
        .await;

    assert!(!is_error(&result));
    let text = envelope_text(&result);
    assert!(text.starts_with("Product added to cart successfully!"));
    assert!(text.contains("**Quantity Added:** 2"));
    assert!(!text.contains("**Status:**"));
}

#[tokio::test]
async fn test_update_to_zero_deletes_entry() {
    let (server, gateway) = occ().await;

    Mock::given(method("DELETE"))
        .and(path(format!("/occ/v2/{SITE}/users/current/carts/00001000/entries/0")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let result = gateway
        .call_tool(
            "update-cart-entry",
            authed(json!({
                "baseSiteId": SITE,
                "userId": "current",
                "cartId": "00001000",
                "entryNumber": 0,
                "quantity": 0
            })),
        )
        .await;

    assert!(!is_error(&result));
    assert!(envelope_text(&result).starts_with("Cart entry removed successfully!"));
}

#[tokio::test]
async fn test_upstream_503_is_error_envelope() {
    let (server, gateway) = occ().await;

    Mock::given(method("GET"))
        .and(path(format!("/occ/v2/{SITE}/users/current/carts/current")))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let result = gateway
        .call_tool(
            "get-cart",
            authed(json!({"baseSiteId": SITE, "userId": "current", "cartId": "current"})),
        )
        .await;

    assert!(is_error(&result));
    assert_eq!(
        envelope_text(&result),
        "Error retrieving cart: SAP Commerce API error! status: 503, message: maintenance"
    );
}

#[tokio::test]
async fn test_upstream_unreachable_is_error_envelope() {
    let gateway = TestGateway::new("http://127.0.0.1:1/occ/v2");

    let result = gateway
        .call_tool("get-base-sites", authed(json!({})))
        .await;

    assert!(is_error(&result));
    assert!(envelope_text(&result).starts_with("Error retrieving base sites: "));
}

#[tokio::test]
async fn test_place_order_requires_terms() {
    let (server, gateway) = occ().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = gateway
        .call_tool(
            "place-order",
            authed(json!({
                "baseSiteId": SITE,
                "userId": "current",
                "cartId": "00001000",
                "termsChecked": false
            })),
        )
        .await;

    assert!(is_error(&result));
    assert!(envelope_text(&result).starts_with("Error: "));
}

#[tokio::test]
async fn test_session_delete_and_reuse() {
    let (_server, gateway) = occ().await;

    let session = gateway.initialize().await;
    assert_eq!(gateway.delete_session(&session).await, StatusCode::NO_CONTENT);
    assert!(!gateway.sessions.contains(&session));
    assert_eq!(gateway.delete_session(&session).await, StatusCode::NOT_FOUND);

    // A stale id is answered under a fresh session.
    let (fresh, reply) = gateway
        .rpc(&json!({"jsonrpc": "2.0", "id": 9, "method": "ping"}), Some(session.as_str()))
        .await;
    assert_ne!(fresh, session);
    assert_eq!(reply["result"], json!({}));
}

#[tokio::test]
async fn test_batch_over_http() {
    let (_server, gateway) = occ().await;

    let batch = json!([
        fixtures::initialize(1),
        {"jsonrpc": "2.0", "method": "notifications/initialized"},
        fixtures::tools_list(2),
    ]);
    let (_, reply) = gateway.rpc(&batch, None).await;

    let items = reply.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], 1);
    assert_eq!(items[1]["result"]["tools"].as_array().unwrap().len(), 15);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (_server, gateway) = occ().await;

    let response = gateway.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = helpers::body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["server"], "sap-commerce-mcp");
}
