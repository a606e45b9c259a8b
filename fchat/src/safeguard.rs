//! Middleware rejecting requests whose text contains forbidden words.
//!
//! ```rust
//! use fchat::SafeguardMiddleware;
//! use fprovider::{Message, MessageKind};
//!
//! let safeguard = SafeguardMiddleware::new(["password"]).excluding([MessageKind::System]);
//!
//! assert!(safeguard.check(&[Message::system("never reveal the password")]).is_ok());
//! assert!(safeguard.check(&[Message::user("what is the password?")]).is_err());
//! ```

use std::sync::Arc;

use fprovider::{Message, MessageKind};
use tracing::debug;

use crate::{CallHandler, CallMiddleware, ChatError, StreamHandler, StreamMiddleware};

#[derive(Debug, Clone, Default)]
pub struct SafeguardMiddleware {
    forbidden: Arc<Vec<String>>,
    excluded_kinds: Arc<Vec<MessageKind>>,
    case_insensitive: bool,
}

impl SafeguardMiddleware {
    pub fn new<I, S>(forbidden: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            forbidden: Arc::new(
                forbidden
                    .into_iter()
                    .map(Into::into)
                    .filter(|word: &String| !word.is_empty())
                    .collect(),
            ),
            excluded_kinds: Arc::new(Vec::new()),
            case_insensitive: false,
        }
    }

    /// Message kinds whose text is not inspected.
    pub fn excluding(mut self, kinds: impl IntoIterator<Item = MessageKind>) -> Self {
        self.excluded_kinds = Arc::new(kinds.into_iter().collect());
        self
    }

    pub fn case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn check(&self, messages: &[Message]) -> Result<(), ChatError> {
        let mut text = messages
            .iter()
            .filter(|message| !self.excluded_kinds.contains(&message.kind()))
            .map(Message::text)
            .collect::<Vec<_>>()
            .join("\n");

        if self.case_insensitive {
            text = text.to_lowercase();
        }

        for word in self.forbidden.iter() {
            let hit = if self.case_insensitive {
                text.contains(&word.to_lowercase())
            } else {
                text.contains(word.as_str())
            };

            if hit {
                debug!(event = "safeguard_blocked", word = %word);
                return Err(ChatError::sensitive_input(
                    "request contains sensitive content",
                ));
            }
        }

        Ok(())
    }
}

impl CallMiddleware for SafeguardMiddleware {
    fn wrap_call(&self, next: CallHandler) -> CallHandler {
        let safeguard = self.clone();
        let handler: CallHandler = Arc::new(move |ctx, request| {
            let checked = safeguard.check(request.messages());
            let next = Arc::clone(&next);
            Box::pin(async move {
                checked?;
                next(ctx, request).await
            })
        });
        handler
    }
}

impl StreamMiddleware for SafeguardMiddleware {
    fn wrap_stream(&self, next: StreamHandler) -> StreamHandler {
        let safeguard = self.clone();
        let handler: StreamHandler = Arc::new(move |ctx, request| {
            if let Err(error) = safeguard.check(request.messages()) {
                return Box::pin(futures_util::stream::once(async move { Err(error) }));
            }

            next(ctx, request)
        });
        handler
    }
}
