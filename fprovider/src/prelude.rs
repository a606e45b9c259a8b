//! Common `fprovider` imports for downstream crates.

pub use crate::{
    AssistantMessage, ChatRequest, ChatResponse, FinishReason, Generation, Media, Message,
    MessageError, MessageErrorKind, MessageKind, ModelOptions, ModelProvider, ProviderError,
    ProviderErrorKind, ResponseAccumulator, ResponseStream, ScriptedProvider, SystemMessage,
    TokenUsage, ToolCall, ToolDefinition, ToolMessage, ToolReturn, UserMessage,
};
pub use fcommon::{BoxFuture, CallContext, MetadataMap, ParamBag};
