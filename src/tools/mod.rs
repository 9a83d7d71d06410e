//! Tool catalog: schemas, result envelopes and the dispatching registry.

pub mod envelope;
pub mod registry;
pub mod schema;

pub use envelope::{ContentBlock, ToolResponse};
pub use registry::{RegistryError, ToolDescriptor, ToolHandler, ToolRegistry};
pub use schema::{InputSchema, ParamSpec, ParamType, parse_args};
