//! sap-commerce-mcp server binary.

use std::sync::Arc;

use clap::Parser;
use sap_commerce_mcp::commerce::{CommerceApi, register_all};
use sap_commerce_mcp::config::{Cli, GatewayConfig};
use sap_commerce_mcp::lifecycle::LifecycleManager;
use sap_commerce_mcp::session::SessionRegistry;
use sap_commerce_mcp::tools::ToolRegistry;
use sap_commerce_mcp::transport::{McpState, UpstreamClient, app};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .json()
        .with_writer(writer)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().apply(GatewayConfig::from_env());
    let lifecycle = Arc::new(LifecycleManager::new());

    let upstream = Arc::new(UpstreamClient::new(config.upstream.clone())?);
    let api = Arc::new(CommerceApi::new(&config.upstream.base_url, upstream)?);
    let mut registry = ToolRegistry::new();
    register_all(&mut registry, api)?;

    let sessions = Arc::new(SessionRegistry::new(config.session.clone()));
    let sweeper = sessions.spawn_sweeper(lifecycle.shutdown_token());

    let state = Arc::new(McpState::new(registry, sessions.clone(), &config.server));
    let router = app(state, lifecycle.clone());

    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr).await?;

    info!(
        addr = %addr,
        upstream = %config.upstream.base_url,
        session_ttl_secs = config.session.ttl.as_secs(),
        max_concurrent_requests = config.server.max_concurrent_requests,
        "sap-commerce-mcp starting"
    );

    spawn_signal_handlers(lifecycle.clone());
    lifecycle.mark_ready();

    let shutdown = lifecycle.shutdown_token();
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await;

    // Signal handlers only fire on signals; a server error must stop the sweeper too.
    lifecycle.begin_shutdown();
    if let Err(e) = sweeper.await {
        error!(error = %e, "Session sweeper task failed");
    }
    let closed = sessions.close_all();
    lifecycle.mark_stopped();
    info!(sessions_closed = closed, "sap-commerce-mcp stopped");

    served?;
    Ok(())
}

fn spawn_signal_handlers(lifecycle: Arc<LifecycleManager>) {
    let on_ctrl_c = lifecycle.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
                on_ctrl_c.begin_shutdown();
            }
            Err(e) => error!(error = %e, "Failed to listen for SIGINT"),
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, initiating graceful shutdown");
                lifecycle.begin_shutdown();
            }
            Err(e) => error!(error = %e, "Failed to listen for SIGTERM"),
        }
    });
}
