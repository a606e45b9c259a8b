//! Call and stream middleware contracts and chain composition.
//!
//! A middleware receives the next handler and returns a new one. Chains are right-folded so
//! the first middleware in the list runs outermost:
//! `chain([m1, m2], h) == m1(m2(h))`.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use fchat::{CallHandler, CallMiddleware, call_handler, call_middleware_fn, chain_call};
//! use fprovider::text_response;
//!
//! let terminal = call_handler(|_ctx, _request| async { Ok(text_response("done")) });
//! let passthrough = call_middleware_fn(|next: CallHandler| next);
//! let middlewares: Vec<Arc<dyn CallMiddleware>> = vec![Arc::new(passthrough)];
//!
//! let _chain = chain_call(&middlewares, terminal);
//! ```

use std::future::Future;
use std::sync::Arc;

use fcommon::{BoxFuture, BoxStream, CallContext};
use fprovider::{ChatRequest, ChatResponse};
use futures_core::Stream;

use crate::ChatError;

pub type ChatFuture = BoxFuture<'static, Result<ChatResponse, ChatError>>;

pub type ChatStream = BoxStream<'static, Result<ChatResponse, ChatError>>;

pub type CallHandler = Arc<dyn Fn(CallContext, ChatRequest) -> ChatFuture + Send + Sync>;

pub type StreamHandler = Arc<dyn Fn(CallContext, ChatRequest) -> ChatStream + Send + Sync>;

/// Wraps a blocking-call handler.
///
/// Implementations may rewrite the request before delegating, inspect or replace the response
/// afterwards, or short-circuit without calling `next` at all. A wrapped handler is shared by
/// every request the client serves, so per-request state belongs in locals, not in captures.
pub trait CallMiddleware: Send + Sync {
    fn wrap_call(&self, next: CallHandler) -> CallHandler;

    /// Sees the response the tool dispatcher built to end a turn (direct return or
    /// external hand-off). That response never flows back through `wrap_call`.
    fn on_turn_terminated<'a>(
        &'a self,
        _ctx: &'a CallContext,
        _request: &'a ChatRequest,
        _response: &'a ChatResponse,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async { Ok(()) })
    }
}

/// Streaming counterpart of [`CallMiddleware`].
pub trait StreamMiddleware: Send + Sync {
    fn wrap_stream(&self, next: StreamHandler) -> StreamHandler;

    /// See [`CallMiddleware::on_turn_terminated`].
    fn on_turn_terminated<'a>(
        &'a self,
        _ctx: &'a CallContext,
        _request: &'a ChatRequest,
        _response: &'a ChatResponse,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async { Ok(()) })
    }
}

pub fn chain_call(middlewares: &[Arc<dyn CallMiddleware>], terminal: CallHandler) -> CallHandler {
    middlewares
        .iter()
        .rev()
        .fold(terminal, |next, middleware| middleware.wrap_call(next))
}

pub fn chain_stream(
    middlewares: &[Arc<dyn StreamMiddleware>],
    terminal: StreamHandler,
) -> StreamHandler {
    middlewares
        .iter()
        .rev()
        .fold(terminal, |next, middleware| middleware.wrap_stream(next))
}

pub fn call_handler<F, Fut>(handler: F) -> CallHandler
where
    F: Fn(CallContext, ChatRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ChatResponse, ChatError>> + Send + 'static,
{
    let handler: CallHandler = Arc::new(move |ctx, request| Box::pin(handler(ctx, request)));
    handler
}

pub fn stream_handler<F, S>(handler: F) -> StreamHandler
where
    F: Fn(CallContext, ChatRequest) -> S + Send + Sync + 'static,
    S: Stream<Item = Result<ChatResponse, ChatError>> + Send + 'static,
{
    let handler: StreamHandler = Arc::new(move |ctx, request| Box::pin(handler(ctx, request)));
    handler
}

/// Closure-backed call middleware.
pub struct CallMiddlewareFn<F> {
    wrap: F,
}

pub fn call_middleware_fn<F>(wrap: F) -> CallMiddlewareFn<F>
where
    F: Fn(CallHandler) -> CallHandler + Send + Sync,
{
    CallMiddlewareFn { wrap }
}

impl<F> CallMiddleware for CallMiddlewareFn<F>
where
    F: Fn(CallHandler) -> CallHandler + Send + Sync,
{
    fn wrap_call(&self, next: CallHandler) -> CallHandler {
        (self.wrap)(next)
    }
}

/// Closure-backed stream middleware.
pub struct StreamMiddlewareFn<F> {
    wrap: F,
}

pub fn stream_middleware_fn<F>(wrap: F) -> StreamMiddlewareFn<F>
where
    F: Fn(StreamHandler) -> StreamHandler + Send + Sync,
{
    StreamMiddlewareFn { wrap }
}

impl<F> StreamMiddleware for StreamMiddlewareFn<F>
where
    F: Fn(StreamHandler) -> StreamHandler + Send + Sync,
{
    fn wrap_stream(&self, next: StreamHandler) -> StreamHandler {
        (self.wrap)(next)
    }
}
