//! Capability layer for registering tools and dispatching model tool calls.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use ftooling::{FunctionTool, ToolDispatcher, ToolRegistry};
//!
//! let registry = Arc::new(ToolRegistry::new());
//! registry.register(
//!     FunctionTool::builder("echo")
//!         .input_schema(r#"{"type":"object"}"#)
//!         .handler(|_ctx, args| async move { Ok(args) })
//!         .build()
//!         .expect("valid tool"),
//! );
//!
//! let dispatcher = ToolDispatcher::new(Arc::clone(&registry));
//! assert_eq!(dispatcher.registry().len(), 1);
//! ```

mod args;
mod context;
mod dispatcher;
mod error;
mod hooks;
mod registry;
mod tool;

pub mod prelude {
    pub use crate::{
        DispatchOutcome, ExternalTool, FunctionTool, NoopToolRuntimeHooks, Tool, ToolContext,
        ToolDispatcher, ToolError, ToolErrorKind, ToolFuture, ToolHistory, ToolMetadata,
        ToolRegistry, ToolRuntimeHooks, parse_arguments, parse_json_object, required_string,
    };
}

pub use args::{parse_arguments, parse_json_object, parse_json_value, required_string};
pub use context::{ToolContext, ToolHistory};
pub use dispatcher::{DispatchOutcome, ToolDispatcher};
pub use error::{ToolError, ToolErrorKind};
pub use hooks::{NoopToolRuntimeHooks, ToolRuntimeHooks};
pub use registry::ToolRegistry;
pub use tool::{
    ExternalTool, ExternalToolBuilder, FunctionTool, FunctionToolBuilder, Tool, ToolFuture,
    ToolMetadata, validate_definition,
};
