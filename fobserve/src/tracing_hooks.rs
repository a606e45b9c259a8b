//! Structured `tracing` events for model calls, streams, and tool executions.
//!
//! ```rust
//! use fobserve::{TracingMiddleware, TracingToolHooks};
//! use fchat::{CallMiddleware, StreamMiddleware};
//! use ftooling::ToolRuntimeHooks;
//!
//! fn accepts_call(_middleware: &dyn CallMiddleware) {}
//! fn accepts_stream(_middleware: &dyn StreamMiddleware) {}
//! fn accepts_hooks(_hooks: &dyn ToolRuntimeHooks) {}
//!
//! accepts_call(&TracingMiddleware);
//! accepts_stream(&TracingMiddleware);
//! accepts_hooks(&TracingToolHooks);
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use fchat::{CallHandler, CallMiddleware, StreamHandler, StreamMiddleware, tool_round};
use fprovider::{ToolCall, ToolReturn};
use ftooling::{ToolContext, ToolError, ToolRuntimeHooks};
use futures_util::StreamExt;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMiddleware;

impl CallMiddleware for TracingMiddleware {
    fn wrap_call(&self, next: CallHandler) -> CallHandler {
        let handler: CallHandler = Arc::new(move |ctx, request| {
            let next = Arc::clone(&next);
            Box::pin(async move {
                let model = request.options().model.clone();
                tracing::info!(
                    phase = "chat",
                    event = "call_start",
                    model = %model,
                    messages = request.messages().len(),
                    tool_round = tool_round(request.params())
                );

                let started = Instant::now();
                let outcome = next(ctx, request).await;
                let elapsed_ms = started.elapsed().as_millis() as u64;

                match &outcome {
                    Ok(response) => tracing::info!(
                        phase = "chat",
                        event = "call_success",
                        model = %model,
                        finish_reason = ?response.finish_reason(),
                        tool_calls = response.tool_calls().len(),
                        elapsed_ms
                    ),
                    Err(error) => tracing::error!(
                        phase = "chat",
                        event = "call_failure",
                        model = %model,
                        error_kind = ?error.kind,
                        error_phase = ?error.phase,
                        elapsed_ms,
                        error = %error
                    ),
                }

                outcome
            })
        });
        handler
    }
}

impl StreamMiddleware for TracingMiddleware {
    fn wrap_stream(&self, next: StreamHandler) -> StreamHandler {
        let handler: StreamHandler = Arc::new(move |ctx, request| {
            let next = Arc::clone(&next);
            Box::pin(async_stream::stream! {
                let model = request.options().model.clone();
                tracing::info!(
                    phase = "chat",
                    event = "stream_start",
                    model = %model,
                    messages = request.messages().len(),
                    tool_round = tool_round(request.params())
                );

                let started = Instant::now();
                let mut chunks = 0_u64;
                let mut failed = false;
                let mut inner = next(ctx, request);
                while let Some(chunk) = inner.next().await {
                    match &chunk {
                        Ok(_) => chunks += 1,
                        Err(error) => {
                            failed = true;
                            tracing::error!(
                                phase = "chat",
                                event = "stream_failure",
                                model = %model,
                                chunks,
                                error_kind = ?error.kind,
                                error = %error
                            );
                        }
                    }
                    yield chunk;
                }

                if !failed {
                    tracing::info!(
                        phase = "chat",
                        event = "stream_finish",
                        model = %model,
                        chunks,
                        elapsed_ms = started.elapsed().as_millis() as u64
                    );
                }
            })
        });
        handler
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingToolHooks;

impl ToolRuntimeHooks for TracingToolHooks {
    fn on_execution_start(&self, tool_call: &ToolCall, context: &ToolContext) {
        tracing::info!(
            phase = "tool",
            event = "execution_start",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            history = context.history().size()
        );
    }

    fn on_execution_success(
        &self,
        tool_call: &ToolCall,
        _context: &ToolContext,
        result: &ToolReturn,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "tool",
            event = "execution_success",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            result_len = result.result.len(),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_execution_failure(
        &self,
        tool_call: &ToolCall,
        _context: &ToolContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "tool",
            event = "execution_failure",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            error = %error
        );
    }

    fn on_external_call(&self, tool_call: &ToolCall) {
        tracing::info!(
            phase = "tool",
            event = "external_call",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id
        );
    }
}
