use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use fprovider::{ToolCall, ToolReturn};
use ftooling::{ToolContext, ToolError, ToolRuntimeHooks};

/// Runs the inner hooks but swallows their panics so observers can never fail a tool call.
pub struct SafeToolHooks<H> {
    inner: H,
}

impl<H> SafeToolHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

fn guarded(hook: &'static str, callback: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(callback)).is_err() {
        tracing::warn!(phase = "tool", event = "hook_panicked", hook);
    }
}

impl<H> ToolRuntimeHooks for SafeToolHooks<H>
where
    H: ToolRuntimeHooks,
{
    fn on_execution_start(&self, tool_call: &ToolCall, context: &ToolContext) {
        guarded("on_execution_start", || {
            self.inner.on_execution_start(tool_call, context)
        });
    }

    fn on_execution_success(
        &self,
        tool_call: &ToolCall,
        context: &ToolContext,
        result: &ToolReturn,
        elapsed: Duration,
    ) {
        guarded("on_execution_success", || {
            self.inner
                .on_execution_success(tool_call, context, result, elapsed)
        });
    }

    fn on_execution_failure(
        &self,
        tool_call: &ToolCall,
        context: &ToolContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        guarded("on_execution_failure", || {
            self.inner
                .on_execution_failure(tool_call, context, error, elapsed)
        });
    }

    fn on_external_call(&self, tool_call: &ToolCall) {
        guarded("on_external_call", || self.inner.on_external_call(tool_call));
    }
}
