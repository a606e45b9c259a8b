//! Common imports for most fconverse applications.

pub use crate::{
    CallContext, CallMiddleware, CallResponse, ChatClient, ChatClientBuilder, ChatError,
    ChatErrorKind, ChatPolicy, ChatPrompt, ChatRequest, ChatResponse, ConversationId,
    ConversationMemory, Expr, ExternalTool, FilterError, FinishReason, FunctionTool,
    InMemoryConversationMemory, ListParser, MapParser, MemoryMiddleware, Message, MessageKind,
    MetricsMiddleware, ModelOptions, ModelProvider, RecoverMiddleware, SafeToolHooks,
    SafeguardMiddleware, ScriptedProvider, StreamMiddleware, SystemPromptTemplate, Tool,
    ToolCall, ToolContext, ToolRegistry, ToolReturn, TracingMiddleware, TracingToolHooks,
    UserPromptTemplate,
};
pub use crate::{chat_client, chat_client_with_memory, in_memory_store, observed_chat_client, parse_filter};
pub use crate::{fc_messages, fc_msg};
