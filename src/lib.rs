//! sap-commerce-mcp: an MCP gateway in front of the SAP Commerce OCC v2 API.
//!
//! MCP clients talk JSON-RPC 2.0 over streamable HTTP at `POST /mcp`. Each
//! client gets a session (`mcp-session-id`), and `tools/call` requests are
//! dispatched to one of fifteen commerce tools that call the OCC API with
//! the bearer token the client passed as `arguments.access_token`.
//!
//! # Layout
//!
//! - [`transport`]: JSON-RPC parsing, method routing, the axum endpoint and
//!   the upstream HTTP client
//! - [`session`]: session registry and idle eviction
//! - [`context`]: per-call credential and correlation data
//! - [`tools`]: input schemas, result envelopes and the dispatching registry
//! - [`commerce`]: the OCC tool catalog
//! - [`lifecycle`]: startup/shutdown state and `GET /health`
//! - [`config`], [`error`], [`logging_layer`]: ambient plumbing

pub mod commerce;
pub mod config;
pub mod context;
pub mod error;
pub mod lifecycle;
pub mod logging_layer;
pub mod session;
pub mod tools;
pub mod transport;
