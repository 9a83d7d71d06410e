//! Liveness probe. Answers 200 whenever the listener can answer at all,
//! including while graceful shutdown drains connections.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use super::LifecycleManager;

/// Name reported by the probe.
pub const SERVER_NAME: &str = "sap-commerce-mcp";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub server: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    /// RFC 3339, UTC.
    pub timestamp: String,
}

/// `GET /health`, unauthenticated.
pub fn health_router(lifecycle: Arc<LifecycleManager>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(lifecycle)
}

async fn health_handler(
    State(lifecycle): State<Arc<LifecycleManager>>,
) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            server: SERVER_NAME,
            version: lifecycle.version(),
            uptime_seconds: lifecycle.uptime_seconds(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn get_health(lifecycle: Arc<LifecycleManager>) -> (StatusCode, Value) {
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = health_router(lifecycle).oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_reports_identity() {
        let (status, json) = get_health(Arc::new(LifecycleManager::new())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["server"], "sap-commerce-mcp");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert!(json["uptime_seconds"].is_u64());
        let timestamp = json["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_health_is_alive_in_every_state() {
        let lifecycle = Arc::new(LifecycleManager::new());
        let transitions: [fn(&LifecycleManager); 3] = [
            LifecycleManager::mark_ready,
            LifecycleManager::begin_shutdown,
            LifecycleManager::mark_stopped,
        ];

        for transition in transitions {
            transition(&lifecycle);
            let (status, json) = get_health(lifecycle.clone()).await;
            assert_eq!(status, StatusCode::OK, "{}", lifecycle.state());
            assert_eq!(json["status"], "healthy");
        }
    }
}
