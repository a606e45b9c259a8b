use std::future::Future;
use std::pin::Pin;

use fcommon::CallContext;

use crate::{ChatRequest, ChatResponse, ModelOptions, ProviderError, ResponseStream};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Pluggable model backend.
///
/// Implementations encode the request onto a wire of their choosing and normalize the
/// reply back into [`ChatResponse`]. Both methods must honor the cancellation and deadline
/// carried by `ctx` before any blocking work.
pub trait ModelProvider: Send + Sync {
    fn default_options(&self) -> ModelOptions;

    fn call<'a>(
        &'a self,
        ctx: CallContext,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<ChatResponse, ProviderError>>;

    fn stream<'a>(&'a self, ctx: CallContext, request: ChatRequest) -> ResponseStream<'a>;
}
