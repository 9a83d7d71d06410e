//! SAP Commerce (OCC v2) tool catalog.
//!
//! - `api`: endpoint building and typed calls through the upstream client
//! - `models`: the partial OCC records the tools read
//! - `format`: text rendering of those records
//! - `tools`: B2C catalog, cart, checkout and order tools
//! - `b2b`: organization-user cart and order tools

pub mod api;
pub mod b2b;
pub mod format;
pub mod models;
pub mod tools;

use std::sync::Arc;

pub use api::CommerceApi;

use crate::tools::{RegistryError, ToolRegistry};

/// Register all fifteen commerce tools.
pub fn register_all(registry: &mut ToolRegistry, api: Arc<CommerceApi>) -> Result<(), RegistryError> {
    tools::register(registry, &api)?;
    b2b::register(registry, &api)?;
    Ok(())
}
