//! Middleware that loads and persists conversation history around every model call.
//!
//! Requests without a conversation id pass straight through. For the rest, the stored
//! history is prepended to the request, messages not yet persisted are written before the
//! model is called, and the model's reply is written afterwards. Persisted messages carry the
//! [`SAVED_MARKER`] metadata key so in-band history supplied by the caller is not saved twice.

use std::sync::Arc;

use fchat::{
    CallHandler, CallMiddleware, ChatError, StreamHandler, StreamMiddleware, conversation_id,
    tool_round,
};
use fcommon::{BoxFuture, CallContext, ConversationId};
use fprovider::{ChatRequest, ChatResponse, Message, ResponseAccumulator};
use futures_util::StreamExt;
use serde_json::Value;
use tracing::debug;

use crate::{ConversationMemory, InMemoryConversationMemory};

/// Metadata key stamped on every message the middleware has persisted.
pub const SAVED_MARKER: &str = "fmemory.saved";

pub fn is_saved(message: &Message) -> bool {
    message.metadata().contains_key(SAVED_MARKER)
}

pub fn mark_saved(message: Message) -> Message {
    if is_saved(&message) {
        return message;
    }

    message.with_metadata(SAVED_MARKER, Value::Null)
}

#[derive(Clone)]
pub struct MemoryMiddleware {
    store: Arc<dyn ConversationMemory>,
}

impl MemoryMiddleware {
    /// Middleware backed by a fresh [`InMemoryConversationMemory`].
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemoryConversationMemory::new()))
    }

    pub fn with_store(store: Arc<dyn ConversationMemory>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn ConversationMemory> {
        Arc::clone(&self.store)
    }
}

impl Default for MemoryMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryMiddleware").finish_non_exhaustive()
    }
}

impl CallMiddleware for MemoryMiddleware {
    fn wrap_call(&self, next: CallHandler) -> CallHandler {
        let store = Arc::clone(&self.store);
        let handler: CallHandler = Arc::new(move |ctx, request| {
            let store = Arc::clone(&store);
            let next = Arc::clone(&next);
            Box::pin(async move {
                let (conversation_id, request) =
                    match prepare(store.as_ref(), &ctx, request).await? {
                        Prepared::Passthrough(request) => return next(ctx, request).await,
                        Prepared::Remembered(conversation_id, request) => {
                            (conversation_id, request)
                        }
                    };

                let response = next(ctx.clone(), request).await?;
                save_output(store.as_ref(), &ctx, &conversation_id, &response).await?;
                Ok(response)
            })
        });
        handler
    }

    fn on_turn_terminated<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: &'a ChatRequest,
        response: &'a ChatResponse,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(save_dispatched(self.store.as_ref(), ctx, request, response))
    }
}

impl StreamMiddleware for MemoryMiddleware {
    fn wrap_stream(&self, next: StreamHandler) -> StreamHandler {
        let store = Arc::clone(&self.store);
        let handler: StreamHandler = Arc::new(move |ctx, request| {
            let store = Arc::clone(&store);
            let next = Arc::clone(&next);
            Box::pin(async_stream::stream! {
                let (conversation_id, request) = match prepare(store.as_ref(), &ctx, request).await {
                    Ok(Prepared::Passthrough(request)) => {
                        let mut chunks = next(ctx, request);
                        while let Some(chunk) = chunks.next().await {
                            yield chunk;
                        }
                        return;
                    }
                    Ok(Prepared::Remembered(conversation_id, request)) => (conversation_id, request),
                    Err(error) => {
                        yield Err(error);
                        return;
                    }
                };

                let mut accumulator = ResponseAccumulator::new();
                let mut chunks = next(ctx.clone(), request);
                while let Some(chunk) = chunks.next().await {
                    match chunk {
                        Ok(chunk) => {
                            accumulator.push(&chunk);
                            yield Ok(chunk);
                        }
                        Err(error) => {
                            yield Err(error);
                            return;
                        }
                    }
                }

                if accumulator.is_empty() {
                    return;
                }

                let response = accumulator.finish();
                if let Err(error) =
                    save_output(store.as_ref(), &ctx, &conversation_id, &response).await
                {
                    yield Err(error);
                }
            })
        });
        handler
    }

    fn on_turn_terminated<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: &'a ChatRequest,
        response: &'a ChatResponse,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(save_dispatched(self.store.as_ref(), ctx, request, response))
    }
}

enum Prepared {
    Passthrough(ChatRequest),
    Remembered(ConversationId, ChatRequest),
}

async fn prepare(
    store: &dyn ConversationMemory,
    ctx: &CallContext,
    request: ChatRequest,
) -> Result<Prepared, ChatError> {
    let Some(conversation_id) = conversation_id(request.params())? else {
        return Ok(Prepared::Passthrough(request));
    };

    let history = store
        .read(ctx, &conversation_id)
        .await?
        .into_iter()
        .map(mark_saved)
        .collect::<Vec<_>>();

    let incoming = request.messages();
    let continuation = tool_round(request.params()) > 0;
    let fresh = incoming
        .iter()
        .enumerate()
        .filter(|(index, message)| {
            // Continuation rounds only append the latest tool returns; everything before
            // them was persisted by the previous round.
            let replayed = continuation && index + 1 < incoming.len();
            !is_saved(message) && !replayed
        })
        .map(|(_, message)| mark_saved(message.clone()))
        .collect::<Vec<_>>();

    debug!(
        event = "memory_load",
        conversation_id = %conversation_id,
        history = history.len(),
        fresh = fresh.len()
    );

    if !fresh.is_empty() {
        store.write(ctx, &conversation_id, fresh.clone()).await?;
    }

    let mut messages = history;
    messages.extend(fresh);
    let request = request.with_messages(messages);

    Ok(Prepared::Remembered(conversation_id, request))
}

async fn save_output(
    store: &dyn ConversationMemory,
    ctx: &CallContext,
    conversation_id: &ConversationId,
    response: &ChatResponse,
) -> Result<(), ChatError> {
    let mut messages = Vec::new();
    for result in response.results() {
        messages.push(mark_saved(Message::Assistant(result.assistant.clone())));
        if let Some(tool_message) = &result.tool_message {
            messages.push(mark_saved(Message::Tool(tool_message.clone())));
        }
    }

    if messages.is_empty() {
        return Ok(());
    }

    debug!(
        event = "memory_save",
        conversation_id = %conversation_id,
        messages = messages.len()
    );
    store.write(ctx, conversation_id, messages).await?;
    Ok(())
}

/// Persists the tool returns of a response the dispatcher built to end the turn. The
/// assistant turn holding the tool calls was already saved when the model replied.
async fn save_dispatched(
    store: &dyn ConversationMemory,
    ctx: &CallContext,
    request: &ChatRequest,
    response: &ChatResponse,
) -> Result<(), ChatError> {
    let Some(conversation_id) = conversation_id(request.params())? else {
        return Ok(());
    };

    let messages = response
        .results()
        .iter()
        .filter_map(|result| result.tool_message.clone())
        .map(|tool_message| mark_saved(Message::Tool(tool_message)))
        .collect::<Vec<_>>();
    if messages.is_empty() {
        return Ok(());
    }

    debug!(
        event = "memory_save_tool_returns",
        conversation_id = %conversation_id,
        messages = messages.len()
    );
    store.write(ctx, &conversation_id, messages).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use fchat::{ChatErrorKind, call_handler, set_conversation_id};
    use fprovider::{ModelOptions, text_response};

    use super::*;

    fn recording_terminal(seen: Arc<Mutex<Vec<ChatRequest>>>) -> CallHandler {
        call_handler(move |_ctx, request: ChatRequest| {
            let seen = Arc::clone(&seen);
            async move {
                seen.lock().expect("seen lock").push(request);
                Ok(text_response("reply"))
            }
        })
    }

    fn request_for(conversation: &str, messages: Vec<Message>) -> ChatRequest {
        let request = ChatRequest::new(messages, ModelOptions::new("m"));
        set_conversation_id(request.params(), conversation);
        request
    }

    #[tokio::test]
    async fn history_is_prepended_and_replies_are_saved() {
        let memory = MemoryMiddleware::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handler = memory.wrap_call(recording_terminal(Arc::clone(&seen)));
        let ctx = CallContext::new();

        handler(ctx.clone(), request_for("c-1", vec![Message::user("one")]))
            .await
            .expect("first turn");
        handler(ctx.clone(), request_for("c-1", vec![Message::user("two")]))
            .await
            .expect("second turn");

        let second = seen.lock().expect("seen lock")[1].clone();
        let texts = second
            .messages()
            .iter()
            .map(Message::text)
            .collect::<Vec<_>>();
        assert_eq!(texts, vec!["one", "reply", "two"]);
        assert!(second.messages().iter().all(is_saved));

        let stored = memory
            .store()
            .read(&ctx, &ConversationId::from("c-1"))
            .await
            .expect("read");
        assert_eq!(stored.len(), 4);
        assert!(stored.iter().all(is_saved));
    }

    #[tokio::test]
    async fn already_saved_messages_are_not_written_again() {
        let memory = MemoryMiddleware::new();
        let handler = memory.wrap_call(recording_terminal(Arc::new(Mutex::new(Vec::new()))));
        let ctx = CallContext::new();

        handler(
            ctx.clone(),
            request_for(
                "c-2",
                vec![mark_saved(Message::user("replayed")), Message::user("new")],
            ),
        )
        .await
        .expect("turn");

        let stored = memory
            .store()
            .read(&ctx, &ConversationId::from("c-2"))
            .await
            .expect("read");
        let texts = stored.iter().map(Message::text).collect::<Vec<_>>();
        assert_eq!(texts, vec!["new", "reply"]);
    }

    #[tokio::test]
    async fn requests_without_conversation_pass_through() {
        let memory = MemoryMiddleware::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handler = memory.wrap_call(recording_terminal(Arc::clone(&seen)));

        let request = ChatRequest::new(vec![Message::user("hi")], ModelOptions::new("m"));
        handler(CallContext::new(), request.clone())
            .await
            .expect("turn");

        assert_eq!(seen.lock().expect("seen lock")[0], request);
    }

    #[tokio::test]
    async fn malformed_conversation_id_is_rejected() {
        let memory = MemoryMiddleware::new();
        let handler = memory.wrap_call(recording_terminal(Arc::new(Mutex::new(Vec::new()))));

        let request = ChatRequest::new(vec![Message::user("hi")], ModelOptions::new("m"));
        request.params().set("fchat.conversation_id", 42);

        let error = handler(CallContext::new(), request)
            .await
            .expect_err("id must be a string");
        assert_eq!(error.kind, ChatErrorKind::InvalidConversationId);
    }

    #[test]
    fn marking_is_idempotent() {
        let message = mark_saved(mark_saved(Message::user("x")));
        assert!(is_saved(&message));
        assert_eq!(message.metadata().len(), 1);
    }
}
