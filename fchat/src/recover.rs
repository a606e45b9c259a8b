//! Middleware converting downstream panics into [`ChatErrorKind::Panicked`] errors.
//!
//! [`ChatErrorKind::Panicked`]: crate::ChatErrorKind::Panicked

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures_util::{FutureExt, StreamExt};
use tracing::warn;

use crate::{CallHandler, CallMiddleware, ChatError, StreamHandler, StreamMiddleware};

/// Catches panics raised while building or polling the downstream future or stream.
///
/// A panicking stream yields a single error item and then ends.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecoverMiddleware;

impl RecoverMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl CallMiddleware for RecoverMiddleware {
    fn wrap_call(&self, next: CallHandler) -> CallHandler {
        let handler: CallHandler = Arc::new(move |ctx, request| {
            let next = Arc::clone(&next);
            Box::pin(async move {
                let future = match panic::catch_unwind(AssertUnwindSafe(|| next(ctx, request))) {
                    Ok(future) => future,
                    Err(payload) => return Err(recovered(payload)),
                };

                AssertUnwindSafe(future)
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| Err(recovered(payload)))
            })
        });
        handler
    }
}

impl StreamMiddleware for RecoverMiddleware {
    fn wrap_stream(&self, next: StreamHandler) -> StreamHandler {
        let handler: StreamHandler = Arc::new(move |ctx, request| {
            let stream = match panic::catch_unwind(AssertUnwindSafe(|| next(ctx, request))) {
                Ok(stream) => stream,
                Err(payload) => {
                    let error = recovered(payload);
                    return Box::pin(futures_util::stream::once(async move { Err(error) }));
                }
            };

            Box::pin(
                AssertUnwindSafe(stream)
                    .catch_unwind()
                    .map(|item| item.unwrap_or_else(|payload| Err(recovered(payload)))),
            )
        });
        handler
    }
}

fn recovered(payload: Box<dyn Any + Send>) -> ChatError {
    let message = panic_message(payload.as_ref());
    warn!(event = "middleware_panic_recovered", panic = %message);
    ChatError::panicked(format!("downstream handler panicked: {message}"))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }

    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }

    "non-string panic payload".to_string()
}
