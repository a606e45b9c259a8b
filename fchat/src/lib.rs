//! Conversational orchestration over model providers.
//!
//! A [`ChatClient`] normalizes each prompt's messages, runs the request through the
//! configured call or stream middleware chain down to the model provider, and drives the
//! tool loop: internal tool calls are executed and fed back to the model until it answers
//! in plain text, a direct-return tool finishes the turn, or an external tool call is handed
//! back to the caller.

mod client;
mod error;
mod invoker;
mod middleware;
mod normalize;
mod params;
mod prompt;
mod recover;
mod safeguard;
mod turn;

pub mod prelude {
    pub use crate::{
        CallHandler, CallMiddleware, CallResponse, ChatClient, ChatClientBuilder, ChatError,
        ChatErrorKind, ChatErrorPhase, ChatPolicy, ChatPrompt, ChatStream, RecoverMiddleware,
        SafeguardMiddleware, StreamHandler, StreamMiddleware,
    };
    pub use fcommon::{CallContext, ConversationId, MetadataMap};
    pub use fprovider::{ChatRequest, ChatResponse, Message, MessageKind, ModelOptions};
    pub use ftooling::{ExternalTool, FunctionTool, Tool, ToolRegistry};
}

pub use client::{ChatClient, ChatClientBuilder, ChatPolicy};
pub use error::{ChatError, ChatErrorKind, ChatErrorPhase, ChatErrorSource, TemplateSource};
pub use invoker::ModelInvoker;
pub use middleware::{
    CallHandler, CallMiddleware, CallMiddlewareFn, ChatFuture, ChatStream, StreamHandler,
    StreamMiddleware, StreamMiddlewareFn, call_handler, call_middleware_fn, chain_call,
    chain_stream, stream_handler, stream_middleware_fn,
};
pub use normalize::{DEFAULT_GREETING, normalize_messages};
pub use params::{conversation_id, output_format, set_conversation_id, set_output_format, tool_round};
pub use prompt::{CallResponse, ChatPrompt};
pub use recover::RecoverMiddleware;
pub use safeguard::SafeguardMiddleware;
