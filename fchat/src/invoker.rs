//! Terminal handlers that hand a request to the model provider.

use std::sync::Arc;

use fcommon::CallContext;
use fprovider::{ChatRequest, MessageKind, ModelProvider, augment_last_of_kind};
use futures_util::StreamExt;
use tracing::debug;

use crate::{CallHandler, ChatError, StreamHandler, output_format};

/// Bridges the middleware chain to a [`ModelProvider`].
///
/// Before every call the invoker appends any format instructions stored in the request
/// parameters to the last user message. The original request is left untouched.
#[derive(Clone)]
pub struct ModelInvoker {
    provider: Arc<dyn ModelProvider>,
}

impl ModelInvoker {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> Arc<dyn ModelProvider> {
        Arc::clone(&self.provider)
    }

    pub fn call_handler(&self) -> CallHandler {
        let provider = Arc::clone(&self.provider);
        let handler: CallHandler = Arc::new(move |ctx: CallContext, request: ChatRequest| {
            let provider = Arc::clone(&provider);
            Box::pin(async move {
                ctx.check()?;
                let request = with_output_format(request)?;
                debug!(
                    event = "model_call",
                    model = %request.options().model,
                    messages = request.messages().len()
                );
                provider.call(ctx, request).await.map_err(ChatError::from)
            })
        });
        handler
    }

    pub fn stream_handler(&self) -> StreamHandler {
        let provider = Arc::clone(&self.provider);
        let handler: StreamHandler = Arc::new(move |ctx: CallContext, request: ChatRequest| {
            let provider = Arc::clone(&provider);
            Box::pin(async_stream::stream! {
                if let Err(error) = ctx.check() {
                    yield Err(ChatError::from(error));
                    return;
                }

                let request = match with_output_format(request) {
                    Ok(request) => request,
                    Err(error) => {
                        yield Err(error);
                        return;
                    }
                };

                debug!(
                    event = "model_stream",
                    model = %request.options().model,
                    messages = request.messages().len()
                );

                let mut chunks = provider.stream(ctx, request);
                while let Some(chunk) = chunks.next().await {
                    yield chunk.map_err(ChatError::from);
                }
            })
        });
        handler
    }
}

impl std::fmt::Debug for ModelInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelInvoker").finish_non_exhaustive()
    }
}

fn with_output_format(request: ChatRequest) -> Result<ChatRequest, ChatError> {
    let Some(instructions) = output_format(request.params()) else {
        return Ok(request);
    };

    let mut messages = request.messages().to_vec();
    augment_last_of_kind(&mut messages, MessageKind::User, |text| {
        Some(format!("{text}\n\n{instructions}"))
    })?;

    Ok(request.with_messages(messages))
}
