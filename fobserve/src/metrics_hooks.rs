//! Metrics for model calls, streams, and tool executions through the `metrics` facade.
//!
//! Nothing is exported until the application installs a recorder.
//!
//! | metric | kind | labels |
//! |---|---|---|
//! | `fchat_requests_total` | counter | `model`, `mode` |
//! | `fchat_request_failures_total` | counter | `model`, `mode`, `error_kind` |
//! | `fchat_request_duration_ms` | histogram | `model`, `mode`, `status` |
//! | `fchat_stream_chunks_total` | counter | `model` |
//! | `fchat_tool_executions_total` | counter | `tool_name` |
//! | `fchat_tool_failures_total` | counter | `tool_name`, `error_kind` |
//! | `fchat_tool_duration_ms` | histogram | `tool_name`, `status` |
//! | `fchat_tool_external_calls_total` | counter | `tool_name` |

use std::sync::Arc;
use std::time::{Duration, Instant};

use fchat::{CallHandler, CallMiddleware, ChatError, StreamHandler, StreamMiddleware};
use fprovider::{ToolCall, ToolReturn};
use ftooling::{ToolContext, ToolError, ToolRuntimeHooks};
use futures_util::StreamExt;

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsMiddleware;

fn record_request(model: &str, mode: &'static str) {
    metrics::counter!(
        "fchat_requests_total",
        "model" => model.to_string(),
        "mode" => mode
    )
    .increment(1);
}

fn record_outcome(model: &str, mode: &'static str, error: Option<&ChatError>, elapsed: Duration) {
    let status = if error.is_some() { "failure" } else { "success" };
    if let Some(error) = error {
        metrics::counter!(
            "fchat_request_failures_total",
            "model" => model.to_string(),
            "mode" => mode,
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }
    metrics::histogram!(
        "fchat_request_duration_ms",
        "model" => model.to_string(),
        "mode" => mode,
        "status" => status
    )
    .record(elapsed.as_secs_f64() * 1000.0);
}

impl CallMiddleware for MetricsMiddleware {
    fn wrap_call(&self, next: CallHandler) -> CallHandler {
        let handler: CallHandler = Arc::new(move |ctx, request| {
            let next = Arc::clone(&next);
            Box::pin(async move {
                let model = request.options().model.clone();
                record_request(&model, "call");

                let started = Instant::now();
                let outcome = next(ctx, request).await;
                record_outcome(&model, "call", outcome.as_ref().err(), started.elapsed());
                outcome
            })
        });
        handler
    }
}

impl StreamMiddleware for MetricsMiddleware {
    fn wrap_stream(&self, next: StreamHandler) -> StreamHandler {
        let handler: StreamHandler = Arc::new(move |ctx, request| {
            let next = Arc::clone(&next);
            Box::pin(async_stream::stream! {
                let model = request.options().model.clone();
                record_request(&model, "stream");

                let started = Instant::now();
                let mut failure = None;
                let mut inner = next(ctx, request);
                while let Some(chunk) = inner.next().await {
                    match &chunk {
                        Ok(_) => {
                            metrics::counter!("fchat_stream_chunks_total", "model" => model.clone())
                                .increment(1);
                        }
                        Err(error) => failure = Some(error.clone()),
                    }
                    yield chunk;
                }

                record_outcome(&model, "stream", failure.as_ref(), started.elapsed());
            })
        });
        handler
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsToolHooks;

impl ToolRuntimeHooks for MetricsToolHooks {
    fn on_execution_start(&self, tool_call: &ToolCall, _context: &ToolContext) {
        metrics::counter!(
            "fchat_tool_executions_total",
            "tool_name" => tool_call.name.clone()
        )
        .increment(1);
    }

    fn on_execution_success(
        &self,
        tool_call: &ToolCall,
        _context: &ToolContext,
        _result: &ToolReturn,
        elapsed: Duration,
    ) {
        metrics::histogram!(
            "fchat_tool_duration_ms",
            "tool_name" => tool_call.name.clone(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64() * 1000.0);
    }

    fn on_execution_failure(
        &self,
        tool_call: &ToolCall,
        _context: &ToolContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "fchat_tool_failures_total",
            "tool_name" => tool_call.name.clone(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "fchat_tool_duration_ms",
            "tool_name" => tool_call.name.clone(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64() * 1000.0);
    }

    fn on_external_call(&self, tool_call: &ToolCall) {
        metrics::counter!(
            "fchat_tool_external_calls_total",
            "tool_name" => tool_call.name.clone()
        )
        .increment(1);
    }
}
