//! Unified facade over the fconverse workspace crates.
//!
//! This crate is meant to be the single dependency for most applications. It re-exports the
//! message model, chat client, tools, memory, observability and filter crates, and adds
//! wiring helpers and message macros for common setups.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use fconverse::prelude::*;
//!
//! # tokio_test_block_on(async {
//! let provider = Arc::new(ScriptedProvider::new());
//! provider.push_text("Hello back");
//!
//! let client = chat_client(provider.clone(), "gpt-4o-mini").expect("client builds");
//! let reply = client
//!     .prompt()
//!     .messages(fc_messages![system => "Be brief.", user => "Hi"])
//!     .call(CallContext::new())
//!     .text()
//!     .await
//!     .expect("turn succeeds");
//!
//! assert_eq!(reply, "Hello back");
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(future: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(future)
//! # }
//! ```

mod macros;

pub mod prelude;
pub mod runtime;

pub use fchat;
pub use fcommon;
pub use ffilter;
pub use fmemory;
pub use fobserve;
pub use fprompt;
pub use fprovider;
pub use ftooling;

pub use fchat::{
    CallHandler, CallMiddleware, CallResponse, ChatClient, ChatClientBuilder, ChatError,
    ChatErrorKind, ChatErrorPhase, ChatErrorSource, ChatPolicy, ChatPrompt, ChatStream,
    RecoverMiddleware, SafeguardMiddleware, StreamHandler, StreamMiddleware, TemplateSource,
    call_middleware_fn, stream_middleware_fn,
};
pub use fcommon::{BoxFuture, CallContext, ConversationId, MetadataMap, ParamBag};
pub use ffilter::{Expr, FilterError, FilterErrorKind, Visitor as FilterVisitor};
pub use fmemory::{
    ConversationMemory, InMemoryConversationMemory, MemoryError, MemoryErrorKind,
    MemoryMiddleware,
};
pub use fobserve::{
    MetricsMiddleware, MetricsToolHooks, SafeToolHooks, TracingMiddleware, TracingToolHooks,
};
pub use fprompt::{
    JsonParser, ListParser, MapParser, PromptError, PromptErrorKind, StructuredParser,
    SystemPromptTemplate, UserPromptTemplate,
};
pub use fprovider::{
    ChatRequest, ChatResponse, FinishReason, Message, MessageKind, ModelOptions, ModelProvider,
    ProviderError, ProviderErrorKind, ScriptedProvider, ToolCall, ToolDefinition, ToolReturn,
};
pub use ftooling::{
    ExternalTool, FunctionTool, Tool, ToolContext, ToolError, ToolErrorKind, ToolRegistry,
    ToolRuntimeHooks,
};

pub use runtime::{chat_client, chat_client_with_memory, in_memory_store, observed_chat_client};

/// Parses a filter expression. See [`ffilter`] for the grammar.
pub fn parse_filter(text: &str) -> Result<Expr, FilterError> {
    ffilter::parse(text)
}

#[cfg(test)]
mod tests {
    use crate::{MessageKind, ToolCall};

    #[test]
    fn fc_msg_macro_creates_expected_message() {
        let message = crate::fc_msg!(user => "hello");
        assert_eq!(message.kind(), MessageKind::User);
        assert_eq!(message.text(), "hello");
    }

    #[test]
    fn fc_msg_macro_attaches_tool_calls() {
        let message = crate::fc_msg!(
            assistant => "checking",
            tool_calls => vec![ToolCall::new("c1", "calc", "{}")],
        );
        let assistant = message.as_assistant().expect("assistant message");
        assert_eq!(assistant.tool_calls.len(), 1);
        assert_eq!(assistant.tool_calls[0].name, "calc");
    }

    #[test]
    fn fc_messages_macro_builds_message_vector() {
        let messages = crate::fc_messages![
            system => "You are concise.",
            user => "Summarize the repo",
            assistant => "Sure.",
        ];

        let kinds = messages.iter().map(|message| message.kind()).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![MessageKind::System, MessageKind::User, MessageKind::Assistant]
        );
        assert!(crate::fc_messages![].is_empty());
    }

    #[test]
    fn parse_filter_delegates_to_ffilter() {
        let expr = crate::parse_filter("a == 1").expect("valid filter");
        assert_eq!(expr.to_string(), "a == 1");
    }
}
