//! Wiring helpers that assemble a ready-to-use [`ChatClient`].

use std::sync::Arc;

use crate::{
    ChatClient, ChatClientBuilder, ChatError, ConversationMemory, InMemoryConversationMemory,
    MemoryMiddleware, MetricsMiddleware, MetricsToolHooks, ModelOptions, ModelProvider,
    RecoverMiddleware, SafeToolHooks, TracingMiddleware,
};

fn base_builder(provider: Arc<dyn ModelProvider>, model: impl Into<String>) -> ChatClientBuilder {
    ChatClient::builder(provider)
        .default_options(ModelOptions::new(model))
        .call_middleware(RecoverMiddleware)
        .stream_middleware(RecoverMiddleware)
}

/// A client for `model` with panic recovery on both chains.
pub fn chat_client(
    provider: Arc<dyn ModelProvider>,
    model: impl Into<String>,
) -> Result<ChatClient, ChatError> {
    base_builder(provider, model).build()
}

/// Like [`chat_client`], with conversation memory backed by `store`.
pub fn chat_client_with_memory(
    provider: Arc<dyn ModelProvider>,
    model: impl Into<String>,
    store: Arc<dyn ConversationMemory>,
) -> Result<ChatClient, ChatError> {
    let memory = MemoryMiddleware::with_store(store);
    base_builder(provider, model)
        .call_middleware(memory.clone())
        .stream_middleware(memory)
        .build()
}

/// A memory-backed client that also emits tracing events and metrics for every model call
/// and tool execution.
pub fn observed_chat_client(
    provider: Arc<dyn ModelProvider>,
    model: impl Into<String>,
) -> Result<ChatClient, ChatError> {
    let memory = MemoryMiddleware::with_store(in_memory_store());
    base_builder(provider, model)
        .call_middleware(TracingMiddleware)
        .call_middleware(MetricsMiddleware)
        .call_middleware(memory.clone())
        .stream_middleware(TracingMiddleware)
        .stream_middleware(MetricsMiddleware)
        .stream_middleware(memory)
        .tool_hooks(Arc::new(SafeToolHooks::new(MetricsToolHooks)))
        .build()
}

pub fn in_memory_store() -> Arc<dyn ConversationMemory> {
    Arc::new(InMemoryConversationMemory::new())
}
