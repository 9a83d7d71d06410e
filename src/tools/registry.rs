//! Tool registry and single-call dispatch.
//!
//! The registry is filled once at startup and read-only afterwards.
//! [`ToolRegistry::dispatch`] owns every gateway-side check (schema,
//! defaults, credential presence) so handlers only perform the upstream
//! call and shape its result.

use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::context::CallContext;
use crate::error::ToolError;
use crate::tools::envelope::ToolResponse;
use crate::tools::schema::InputSchema;
use crate::transport::jsonrpc::ToolDefinition;

/// Implementation of one tool.
///
/// `args` has already been validated against the tool's schema, with
/// defaults applied.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(
        &self,
        args: Map<String, Value>,
        ctx: &CallContext,
    ) -> Result<ToolResponse, ToolError>;
}

#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: InputSchema,
    pub requires_credential: bool,
    /// Prepended to upstream failures, e.g. `Error retrieving cart`
    pub failure_prefix: &'static str,
    pub handler: Arc<dyn ToolHandler>,
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("requires_credential", &self.requires_credential)
            .field("params", &self.schema.params().len())
            .finish_non_exhaustive()
    }
}

impl ToolDescriptor {
    /// Credential-requiring tool with a generic failure prefix.
    pub fn new(
        name: &'static str,
        description: &'static str,
        schema: InputSchema,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name,
            description,
            schema,
            requires_credential: true,
            failure_prefix: "Error",
            handler,
        }
    }

    pub fn failure_prefix(mut self, prefix: &'static str) -> Self {
        self.failure_prefix = prefix;
        self
    }

    pub fn public(mut self) -> Self {
        self.requires_credential = false;
        self
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.to_string(),
            description: Some(self.description.to_string()),
            input_schema: self.schema.to_json_schema(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool '{name}' is already registered")]
    DuplicateTool { name: String },
}

/// Name → descriptor map, iterated in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.tools.iter().map(|t| t.name))
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<(), RegistryError> {
        if self.index.contains_key(descriptor.name) {
            return Err(RegistryError::DuplicateTool {
                name: descriptor.name.to_string(),
            });
        }
        debug!(tool = descriptor.name, "Tool registered");
        self.index.insert(descriptor.name, self.tools.len());
        self.tools.push(descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(ToolDescriptor::definition).collect()
    }

    /// Run one tool call. Never fails: every problem becomes an error
    /// envelope.
    pub async fn dispatch(&self, name: &str, raw_args: &Value, ctx: &CallContext) -> ToolResponse {
        let Some(tool) = self.get(name) else {
            warn!(
                correlation_id = %ctx.correlation_id,
                tool = %name,
                "Unknown tool requested"
            );
            return ToolResponse::error(
                ToolError::UnknownTool {
                    name: name.to_string(),
                }
                .render("Error"),
            );
        };

        match self.run(tool, raw_args, ctx).await {
            Ok(response) => {
                info!(
                    correlation_id = %ctx.correlation_id,
                    session_id = %ctx.session_id,
                    tool = tool.name,
                    is_error = response.is_error,
                    "Tool call completed"
                );
                response
            }
            Err(err) => {
                warn!(
                    correlation_id = %ctx.correlation_id,
                    session_id = %ctx.session_id,
                    tool = tool.name,
                    error_type = err.error_type_name(),
                    status = err_status(&err),
                    "Tool call failed"
                );
                ToolResponse::error(err.render(tool.failure_prefix))
            }
        }
    }

    async fn run(
        &self,
        tool: &ToolDescriptor,
        raw_args: &Value,
        ctx: &CallContext,
    ) -> Result<ToolResponse, ToolError> {
        let args = tool
            .schema
            .validate(raw_args)
            .map_err(|violations| ToolError::Validation { violations })?;

        if tool.requires_credential && ctx.credential.is_none() {
            return Err(ToolError::MissingCredential);
        }

        match AssertUnwindSafe(tool.handler.call(args, ctx))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    correlation_id = %ctx.correlation_id,
                    tool = tool.name,
                    "Tool handler panicked"
                );
                Err(ToolError::Internal)
            }
        }
    }
}

fn err_status(err: &ToolError) -> u16 {
    match err {
        ToolError::Upstream(e) => e.status().unwrap_or(0),
        _ => 0,
    }
}
