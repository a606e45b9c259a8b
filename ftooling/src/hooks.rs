//! Runtime hooks for tool execution lifecycle events.
//!
//! ```rust
//! use ftooling::{NoopToolRuntimeHooks, ToolRuntimeHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn ToolRuntimeHooks) {}
//!
//! let hooks = NoopToolRuntimeHooks;
//! assert_hooks_trait(&hooks);
//! ```

use std::time::Duration;

use fprovider::{ToolCall, ToolReturn};

use crate::{ToolContext, ToolError};

pub trait ToolRuntimeHooks: Send + Sync {
    fn on_execution_start(&self, _tool_call: &ToolCall, _context: &ToolContext) {}

    fn on_execution_success(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolContext,
        _result: &ToolReturn,
        _elapsed: Duration,
    ) {
    }

    fn on_execution_failure(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolContext,
        _error: &ToolError,
        _elapsed: Duration,
    ) {
    }

    /// Called for calls that are handed back to the caller instead of executed.
    fn on_external_call(&self, _tool_call: &ToolCall) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopToolRuntimeHooks;

impl ToolRuntimeHooks for NoopToolRuntimeHooks {}
