//! Gateway configuration.
//!
//! Everything has a default and can be overridden from the environment.
//! The listen address and upstream URL can also be given on the command
//! line, which wins over the environment. Environment variables are only
//! read by [`GatewayConfig::from_env`], so a bad value there logs a warning
//! and falls back instead of aborting argument parsing.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;

use crate::session::SessionConfig;
use crate::transport::server::McpServerConfig;
use crate::transport::upstream::{UpstreamConfig, env_parse};

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_BIND: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Command line overrides.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "sap-commerce-mcp", version, about = "MCP gateway for SAP Commerce OCC")]
pub struct Cli {
    /// TCP port to listen on
    #[arg(long)]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// OCC v2 base URL of the commerce tenant
    #[arg(long = "upstream-url")]
    pub upstream_url: Option<String>,
}

impl Cli {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(self, mut config: GatewayConfig) -> GatewayConfig {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(url) = self.upstream_url.filter(|u| !u.trim().is_empty()) {
            config.upstream.base_url = url;
        }
        config
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub server: McpServerConfig,
    pub upstream: UpstreamConfig,
    pub session: SessionConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND,
            port: DEFAULT_PORT,
            server: McpServerConfig::default(),
            upstream: UpstreamConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// # Environment Variables
    ///
    /// - `PORT` (default: 3001)
    /// - `MCP_BIND` (default: 0.0.0.0)
    /// - `MCP_MAX_BODY_BYTES` (default: 10485760 = 10MB)
    /// - `MCP_MAX_CONCURRENT_REQUESTS` (default: 10000)
    ///
    /// Upstream and session settings are read by
    /// [`UpstreamConfig::from_env`] and [`SessionConfig::from_env`].
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bind: env_parse("MCP_BIND", defaults.bind),
            port: env_parse("PORT", defaults.port),
            server: McpServerConfig {
                max_body_size: env_parse("MCP_MAX_BODY_BYTES", defaults.server.max_body_size),
                max_concurrent_requests: env_parse(
                    "MCP_MAX_CONCURRENT_REQUESTS",
                    defaults.server.max_concurrent_requests,
                ),
            },
            upstream: UpstreamConfig::from_env(),
            session: SessionConfig::from_env(),
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}
