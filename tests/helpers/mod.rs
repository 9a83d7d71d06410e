//! Shared setup for the integration tests.
//!
//! Not every test binary uses every helper.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use sap_commerce_mcp::commerce::{CommerceApi, register_all};
use sap_commerce_mcp::lifecycle::LifecycleManager;
use sap_commerce_mcp::session::{SessionConfig, SessionRegistry};
use sap_commerce_mcp::tools::ToolRegistry;
use sap_commerce_mcp::transport::{
    McpServerConfig, McpState, SESSION_HEADER, UpstreamClient, UpstreamConfig, app,
};
use serde_json::Value;
use tower::ServiceExt;

/// The full HTTP application wired against a commerce base URL.
pub struct TestGateway {
    pub router: Router,
    pub sessions: Arc<SessionRegistry>,
    pub lifecycle: Arc<LifecycleManager>,
}

impl TestGateway {
    /// `occ_base` is typically `format!("{}/occ/v2", mock_server.uri())`.
    pub fn new(occ_base: &str) -> Self {
        Self::with_config(occ_base, McpServerConfig::default(), SessionConfig::default())
    }

    pub fn with_config(occ_base: &str, server: McpServerConfig, session: SessionConfig) -> Self {
        let upstream = Arc::new(UpstreamClient::new(UpstreamConfig::with_base_url(occ_base)).unwrap());
        let api = Arc::new(CommerceApi::new(occ_base, upstream).unwrap());
        let mut registry = ToolRegistry::new();
        register_all(&mut registry, api).unwrap();

        let sessions = Arc::new(SessionRegistry::new(session));
        let lifecycle = Arc::new(LifecycleManager::new());
        let state = Arc::new(McpState::new(registry, sessions.clone(), &server));

        Self {
            router: app(state, lifecycle.clone()),
            sessions,
            lifecycle,
        }
    }

    /// POST a raw body to `/mcp`.
    pub async fn post(&self, body: &str, session: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("Content-Type", "application/json");
        if let Some(id) = session {
            builder = builder.header(SESSION_HEADER, id);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }

    /// POST a JSON-RPC message and decode the JSON reply.
    pub async fn rpc(&self, message: &Value, session: Option<&str>) -> (String, Value) {
        let response = self.post(&message.to_string(), session).await;
        assert_eq!(response.status(), StatusCode::OK);
        let session_id = session_id(&response);
        (session_id, body_json(response).await)
    }

    /// `tools/call` and return the result envelope.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Value {
        let (_, reply) = self
            .rpc(&fixtures::tools_call(1, name, arguments), None)
            .await;
        reply["result"].clone()
    }

    /// Run the `initialize` handshake and return the session id.
    pub async fn initialize(&self) -> String {
        let (session_id, reply) = self.rpc(&fixtures::initialize(0), None).await;
        assert!(reply["result"]["serverInfo"].is_object());
        session_id
    }

    pub async fn delete_session(&self, session: &str) -> StatusCode {
        let request = Request::builder()
            .method("DELETE")
            .uri("/mcp")
            .header(SESSION_HEADER, session)
            .body(Body::empty())
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap().status()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn session_id(response: &Response<Body>) -> String {
    response
        .headers()
        .get(SESSION_HEADER)
        .expect("every /mcp response carries the session header")
        .to_str()
        .unwrap()
        .to_string()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Text of the first content block of a result envelope.
pub fn envelope_text(result: &Value) -> &str {
    result["content"][0]["text"].as_str().unwrap_or_default()
}

pub fn is_error(result: &Value) -> bool {
    result["isError"].as_bool().unwrap_or(false)
}
