//! Streamable HTTP endpoint for MCP.
//!
//! # Request Flow
//!
//! 1. Acquire a concurrency permit (or return 503)
//! 2. Parse JSON-RPC request(s)
//! 3. Resolve the session from `mcp-session-id` (or create one)
//! 4. Route each request via `McpRouter`
//! 5. Answer `initialize`/`ping`/`tools/list` locally, dispatch `tools/call`
//!    through the tool registry
//! 6. Refresh session activity and return the response(s) with the
//!    session header
//!
//! Requests rejected in steps 1 or 2 never create a session; the header is
//! echoed only when it names a live one.
//!
//! `DELETE /mcp` ends a session. `GET /mcp` (server-sent events) is not
//! offered and answers 405.

use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use bytes::Bytes;
use serde_json::{Value, json};
use tokio::sync::Semaphore;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info, warn};

use crate::context::CallContext;
use crate::error::GatewayError;
use crate::lifecycle::{LifecycleManager, health_router};
use crate::logging_layer::logging_layer;
use crate::session::{Session, SessionRegistry};
use crate::tools::ToolRegistry;
use crate::transport::jsonrpc::{
    BatchItem, JsonRpcId, JsonRpcResponse, McpRequest, ParsedRequests, fast_correlation_id,
    parse_jsonrpc,
};
use crate::transport::router::{McpRouter, RouteTarget, initialize_result};

/// Header carrying the session id in both directions.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Path of the MCP endpoint.
pub const MCP_PATH: &str = "/mcp";

const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;
const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 10_000;

const SERVICE_UNAVAILABLE_BODY: &[u8] =
    br#"{"jsonrpc":"2.0","id":null,"error":{"code":-32013,"message":"Service temporarily unavailable"}}"#;
const SERIALIZATION_FAILED_BODY: &[u8] =
    br#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error: failed to serialize response"}}"#;
const INTERNAL_ERROR_BODY: &[u8] =
    br#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error"}}"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpServerConfig {
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Maximum concurrent requests
    pub max_concurrent_requests: usize,
}

impl Default for McpServerConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
        }
    }
}

/// State shared by every request handler.
pub struct McpState {
    pub registry: ToolRegistry,
    pub sessions: Arc<SessionRegistry>,
    pub router: McpRouter,
    pub semaphore: Arc<Semaphore>,
    pub max_body_size: usize,
}

impl McpState {
    pub fn new(registry: ToolRegistry, sessions: Arc<SessionRegistry>, config: &McpServerConfig) -> Self {
        Self {
            registry,
            sessions,
            router: McpRouter::new(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_requests)),
            max_body_size: config.max_body_size,
        }
    }
}

/// The `/mcp` routes with the body limit applied.
pub fn mcp_router(state: Arc<McpState>) -> Router {
    let max_body_size = state.max_body_size;
    Router::new()
        .route(
            MCP_PATH,
            post(handle_mcp_post)
                .delete(handle_mcp_delete)
                .get(handle_mcp_get),
        )
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(state)
}

/// CORS policy: any origin, session header readable by browsers.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(SESSION_HEADER)])
}

/// Full application: MCP endpoint, health probe, CORS and access logging.
pub fn app(state: Arc<McpState>, lifecycle: Arc<LifecycleManager>) -> Router {
    mcp_router(state)
        .merge(health_router(lifecycle))
        .layer(cors_layer())
        .layer(logging_layer())
}

async fn handle_mcp_post(
    State(state): State<Arc<McpState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let permit = match Arc::clone(&state.semaphore).try_acquire_owned() {
        Ok(permit) => permit,
        Err(_) => {
            warn!("Max concurrent requests reached, returning 503");
            return rejected(
                &state,
                &headers,
                StatusCode::SERVICE_UNAVAILABLE,
                Bytes::from_static(SERVICE_UNAVAILABLE_BODY),
            );
        }
    };

    let parsed = match parse_jsonrpc(&body) {
        Ok(parsed) => parsed,
        Err(e) => {
            let correlation_id = fast_correlation_id().to_string();
            debug!(correlation_id = %correlation_id, error = %e, "Rejected request body");
            let (status, bytes) = error_bytes(None, &e, &correlation_id);
            return rejected(&state, &headers, status, bytes);
        }
    };

    let (session, _created) = state.sessions.resolve(session_header(&headers));

    // Detached so a client disconnect does not cancel in-flight upstream calls.
    let task = tokio::spawn({
        let state = Arc::clone(&state);
        let session = Arc::clone(&session);
        async move {
            let _permit = permit;
            handle_parsed(&state, &session, parsed).await
        }
    });
    let (status, bytes) = match task.await {
        Ok(reply) => reply,
        Err(e) => {
            error!(session_id = %session.id(), error = %e, "Request task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Bytes::from_static(INTERNAL_ERROR_BODY),
            )
        }
    };

    state.sessions.touch(session.id());
    session.transport().record_exchange();

    with_session_header(
        (status, [(header::CONTENT_TYPE, "application/json")], bytes).into_response(),
        session.id(),
    )
}

/// Reply to a request that was turned away before session resolution.
fn rejected(state: &McpState, headers: &HeaderMap, status: StatusCode, bytes: Bytes) -> Response {
    let response = (status, [(header::CONTENT_TYPE, "application/json")], bytes).into_response();
    match session_header(headers).filter(|id| state.sessions.touch(id)) {
        Some(id) => with_session_header(response, id),
        None => response,
    }
}

async fn handle_mcp_delete(State(state): State<Arc<McpState>>, headers: HeaderMap) -> Response {
    let Some(id) = session_header(&headers) else {
        let error = GatewayError::InvalidRequest {
            details: format!("missing {SESSION_HEADER} header"),
        };
        let (_, bytes) = error_bytes(None, &error, &fast_correlation_id().to_string());
        return (
            StatusCode::BAD_REQUEST,
            [(header::CONTENT_TYPE, "application/json")],
            bytes,
        )
            .into_response();
    };

    if state.sessions.close(id) {
        info!(session_id = %id, "Session terminated by client");
        with_session_header(StatusCode::NO_CONTENT.into_response(), id)
    } else {
        debug!(session_id = %id, "DELETE for unknown session");
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn handle_mcp_get() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST, DELETE")],
    )
        .into_response()
}

fn session_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

fn with_session_header(mut response: Response, session_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(session_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(SESSION_HEADER), value);
    }
    response
}

async fn handle_parsed(state: &McpState, session: &Session, parsed: ParsedRequests) -> (StatusCode, Bytes) {
    match parsed {
        ParsedRequests::Single(request) => match handle_request(state, session, request).await {
            Some(response) => json_bytes(&response),
            None => (StatusCode::NO_CONTENT, Bytes::new()),
        },
        ParsedRequests::Batch(items) => handle_batch(state, session, items).await,
    }
}

/// Handle one request. Returns `None` for notifications.
async fn handle_request(state: &McpState, session: &Session, request: McpRequest) -> Option<JsonRpcResponse> {
    let correlation_id = request.correlation_id.to_string();
    let id = request.id.clone();
    let is_notification = request.is_notification();

    debug!(
        correlation_id = %correlation_id,
        session_id = %session.id(),
        method = %request.method,
        is_notification,
        "Processing request"
    );

    let result = match state.router.route(request) {
        RouteTarget::Initialize { request } => {
            session.mark_initialized();
            Ok(initialize_result(&request))
        }
        RouteTarget::Ping { .. } | RouteTarget::Notification { .. } => Ok(json!({})),
        RouteTarget::ToolsList { .. } => serde_json::to_value(state.registry.definitions())
            .map(|tools| json!({ "tools": tools }))
            .map_err(|e| {
                error!(correlation_id = %correlation_id, error = %e, "Failed to serialize tool catalog");
                GatewayError::InternalError {
                    correlation_id: correlation_id.clone(),
                }
            }),
        RouteTarget::ToolsCall { request } => handle_tools_call(state, session, &request).await,
        RouteTarget::MethodNotFound { request } => Err(GatewayError::MethodNotFound {
            method: request.method,
        }),
    };

    if is_notification {
        if let Err(e) = result {
            debug!(correlation_id = %correlation_id, error = %e, "Notification failed");
        }
        return None;
    }

    Some(match result {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, e.to_jsonrpc_error(&correlation_id)),
    })
}

async fn handle_tools_call(
    state: &McpState,
    session: &Session,
    request: &McpRequest,
) -> Result<Value, GatewayError> {
    let name = request
        .param("name")
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::InvalidParams {
            details: "tools/call requires a string 'name'".to_string(),
        })?;
    let arguments = request.param("arguments").cloned().unwrap_or(Value::Null);

    let ctx = CallContext::for_request(request, session.id());
    let envelope = state.registry.dispatch(name, &arguments, &ctx).await;

    serde_json::to_value(&envelope).map_err(|e| {
        error!(correlation_id = %ctx.correlation_id, error = %e, "Failed to serialize tool result");
        GatewayError::InternalError {
            correlation_id: ctx.correlation_id.clone(),
        }
    })
}

/// Requests run in order; notifications produce no entry.
async fn handle_batch(state: &McpState, session: &Session, items: Vec<BatchItem>) -> (StatusCode, Bytes) {
    let mut responses = Vec::with_capacity(items.len());

    for item in items {
        match item {
            BatchItem::Valid(request) => {
                if let Some(response) = handle_request(state, session, request).await {
                    responses.push(response);
                }
            }
            BatchItem::Invalid { id, error } => {
                let correlation_id = fast_correlation_id().to_string();
                responses.push(JsonRpcResponse::error(
                    id,
                    error.to_jsonrpc_error(&correlation_id),
                ));
            }
        }
    }

    if responses.is_empty() {
        return (StatusCode::NO_CONTENT, Bytes::new());
    }

    match serde_json::to_vec(&responses) {
        Ok(bytes) => (StatusCode::OK, Bytes::from(bytes)),
        Err(e) => {
            error!(error = %e, "Failed to serialize batch response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Bytes::from_static(SERIALIZATION_FAILED_BODY),
            )
        }
    }
}

fn json_bytes(response: &JsonRpcResponse) -> (StatusCode, Bytes) {
    match serde_json::to_vec(response) {
        Ok(bytes) => (StatusCode::OK, Bytes::from(bytes)),
        Err(e) => {
            error!(error = %e, "Failed to serialize response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Bytes::from_static(SERIALIZATION_FAILED_BODY),
            )
        }
    }
}

/// JSON-RPC errors still return HTTP 200.
fn error_bytes(id: Option<JsonRpcId>, error: &GatewayError, correlation_id: &str) -> (StatusCode, Bytes) {
    let response = JsonRpcResponse::error(id, error.to_jsonrpc_error(correlation_id));
    match serde_json::to_vec(&response) {
        Ok(bytes) => (StatusCode::OK, Bytes::from(bytes)),
        Err(_) => (StatusCode::OK, Bytes::from_static(INTERNAL_ERROR_BODY)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::session::SessionConfig;
    use crate::tools::{InputSchema, ParamType, ToolDescriptor, ToolHandler, ToolResponse};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::Map;
    use tower::ServiceExt;

    struct Echo;

    #[async_trait::async_trait]
    impl ToolHandler for Echo {
        async fn call(&self, args: Map<String, Value>, ctx: &CallContext) -> Result<ToolResponse, ToolError> {
            let token = ctx.credential.as_ref().map(|c| c.expose().to_string());
            Ok(ToolResponse::text(format!(
                "{} {}",
                args["word"].as_str().unwrap_or_default(),
                token.unwrap_or_default()
            )))
        }
    }

    fn test_state(config: McpServerConfig) -> Arc<McpState> {
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolDescriptor::new(
                "echo",
                "Echo a word",
                InputSchema::new().required("word", ParamType::String, "word"),
                Arc::new(Echo),
            ))
            .unwrap();
        let sessions = Arc::new(SessionRegistry::new(SessionConfig::default()));
        Arc::new(McpState::new(registry, sessions, &config))
    }

    fn post(body: &str, session: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(MCP_PATH)
            .header("Content-Type", "application/json");
        if let Some(id) = session {
            builder = builder.header(SESSION_HEADER, id);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn session_of(response: &Response) -> String {
        response.headers()[SESSION_HEADER].to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_initialize_creates_session() {
        let state = test_state(McpServerConfig::default());
        let response = mcp_router(state.clone())
            .oneshot(post(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05"}}"#,
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let session_id = session_of(&response);
        assert!(state.sessions.contains(&session_id));

        let json = body_json(response).await;
        assert_eq!(json["id"], 1);
        assert_eq!(json["result"]["protocolVersion"], "2024-11-05");

        let (session, created) = state.sessions.resolve(Some(session_id.as_str()));
        assert!(!created);
        assert!(session.is_initialized());
    }

    #[tokio::test]
    async fn test_known_session_is_reused() {
        let state = test_state(McpServerConfig::default());
        let first = mcp_router(state.clone())
            .oneshot(post(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#, None))
            .await
            .unwrap();
        let id = session_of(&first);

        let second = mcp_router(state.clone())
            .oneshot(post(r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#, Some(id.as_str())))
            .await
            .unwrap();
        assert_eq!(session_of(&second), id);
        assert_eq!(state.sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_session_gets_fresh_id() {
        let state = test_state(McpServerConfig::default());
        let response = mcp_router(state.clone())
            .oneshot(post(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#, Some("client-made-up")))
            .await
            .unwrap();

        let id = session_of(&response);
        assert_ne!(id, "client-made-up");
        assert!(!state.sessions.contains("client-made-up"));
    }

    #[tokio::test]
    async fn test_tools_list_and_call() {
        let state = test_state(McpServerConfig::default());

        let list = mcp_router(state.clone())
            .oneshot(post(r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#, None))
            .await
            .unwrap();
        let json = body_json(list).await;
        assert_eq!(json["id"], "a");
        assert_eq!(json["result"]["tools"][0]["name"], "echo");
        assert_eq!(json["result"]["tools"][0]["inputSchema"]["required"], json!(["word"]));

        let call = mcp_router(state)
            .oneshot(post(
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"echo","arguments":{"word":"hi","access_token":"tok"}}}"#,
                None,
            ))
            .await
            .unwrap();
        let json = body_json(call).await;
        assert_eq!(json["result"]["content"][0]["type"], "text");
        assert_eq!(json["result"]["content"][0]["text"], "hi tok");
        assert!(json["result"].get("isError").is_none());
    }

    #[tokio::test]
    async fn test_tools_call_without_name_is_invalid_params() {
        let state = test_state(McpServerConfig::default());
        let response = mcp_router(state)
            .oneshot(post(
                r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"arguments":{}}}"#,
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], -32602);
        assert_eq!(json["id"], 3);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let state = test_state(McpServerConfig::default());
        let response = mcp_router(state)
            .oneshot(post(r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#, None))
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], -32601);
        assert_eq!(json["error"]["data"]["error_type"], "method_not_found");
    }

    #[tokio::test]
    async fn test_notification_no_content_keeps_header() {
        let state = test_state(McpServerConfig::default());
        let response = mcp_router(state)
            .oneshot(post(
                r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().contains_key(SESSION_HEADER));
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let state = test_state(McpServerConfig::default());
        let response = mcp_router(state.clone())
            .oneshot(post(r#"{"invalid json"#, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(SESSION_HEADER));
        assert!(state.sessions.is_empty());
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], -32700);
        assert_eq!(json["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_malformed_json_keeps_known_session() {
        let state = test_state(McpServerConfig::default());
        let (session, _) = state.sessions.resolve(None);

        let response = mcp_router(state.clone())
            .oneshot(post("garbage", Some(session.id())))
            .await
            .unwrap();

        assert_eq!(session_of(&response), session.id());
        assert_eq!(state.sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_batch_mixed() {
        let state = test_state(McpServerConfig::default());
        let body = r#"[
            {"jsonrpc":"2.0","id":1,"method":"ping"},
            {"jsonrpc":"2.0","method":"notifications/initialized"},
            {"jsonrpc":"2.0","id":2,"method":"nope"},
            {"id":3}
        ]"#;
        let response = mcp_router(state).oneshot(post(body, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["id"], 1);
        assert_eq!(items[1]["error"]["code"], -32601);
        assert_eq!(items[2]["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn test_batch_all_notifications() {
        let state = test_state(McpServerConfig::default());
        let body = r#"[{"jsonrpc":"2.0","method":"notifications/initialized"}]"#;
        let response = mcp_router(state).oneshot(post(body, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_max_concurrency() {
        let state = test_state(McpServerConfig {
            max_concurrent_requests: 0,
            ..McpServerConfig::default()
        });
        let response = mcp_router(state.clone())
            .oneshot(post(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!response.headers().contains_key(SESSION_HEADER));
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], -32013);
    }

    #[tokio::test]
    async fn test_rejected_requests_create_no_sessions() {
        let state = test_state(McpServerConfig {
            max_concurrent_requests: 0,
            ..McpServerConfig::default()
        });

        for _ in 0..100 {
            let response = mcp_router(state.clone())
                .oneshot(post("garbage", None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        }
        assert_eq!(state.sessions.len(), 0);

        let (session, _) = state.sessions.resolve(None);
        let response = mcp_router(state.clone())
            .oneshot(post(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#, Some(session.id())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(session_of(&response), session.id());
        assert_eq!(state.sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_body_size_limit() {
        let state = test_state(McpServerConfig {
            max_body_size: 10,
            ..McpServerConfig::default()
        });
        let response = mcp_router(state)
            .oneshot(post(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let state = test_state(McpServerConfig::default());
        let (session, _) = state.sessions.resolve(None);
        let id = session.id().to_string();

        let delete = |id: Option<String>| {
            let mut builder = Request::builder().method("DELETE").uri(MCP_PATH);
            if let Some(id) = id {
                builder = builder.header(SESSION_HEADER, id);
            }
            builder.body(Body::empty()).unwrap()
        };

        let response = mcp_router(state.clone()).oneshot(delete(Some(id.clone()))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(!state.sessions.contains(&id));
        assert!(session.transport().is_closed());

        let again = mcp_router(state.clone()).oneshot(delete(Some(id))).await.unwrap();
        assert_eq!(again.status(), StatusCode::NOT_FOUND);

        let missing = mcp_router(state).oneshot(delete(None)).await.unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_not_allowed() {
        let state = test_state(McpServerConfig::default());
        let request = Request::builder()
            .method("GET")
            .uri(MCP_PATH)
            .body(Body::empty())
            .unwrap();
        let response = mcp_router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_app_exposes_session_header_via_cors() {
        let state = test_state(McpServerConfig::default());
        let request = Request::builder()
            .method("POST")
            .uri(MCP_PATH)
            .header("Origin", "https://agent.example")
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#))
            .unwrap();
        let response = app(state, Arc::new(LifecycleManager::new()))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        let exposed = response.headers()["access-control-expose-headers"]
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        assert!(exposed.contains(SESSION_HEADER));
    }
}
