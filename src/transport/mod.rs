//! MCP transport: JSON-RPC parsing, method routing, the HTTP endpoint and
//! the commerce upstream client.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────────────────┐     ┌──────────────┐
//! │  MCP Host   │────▶│       sap-commerce-mcp       │────▶│ SAP Commerce │
//! │  (Agent)    │◀────│  POST /mcp → tool registry   │◀────│   OCC v2     │
//! └─────────────┘     └──────────────────────────────┘     └──────────────┘
//! ```

pub mod jsonrpc;
pub mod router;
pub mod server;
pub mod upstream;

pub use jsonrpc::{
    BatchItem, JsonRpcId, JsonRpcResponse, McpRequest, ParsedRequests, ToolDefinition,
};
pub use router::{McpRouter, RouteTarget};
pub use server::{McpServerConfig, McpState, SESSION_HEADER, app};
pub use upstream::{UpstreamClient, UpstreamConfig, UpstreamForwarder, UpstreamRequest};
