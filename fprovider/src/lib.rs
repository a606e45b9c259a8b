//! Message model, request/response values, and the model provider contract.
//!
//! ```rust
//! use fprovider::{ChatRequest, Message, ModelOptions};
//!
//! let request = ChatRequest::new(
//!     vec![Message::system("be brief"), Message::user("hi")],
//!     ModelOptions::new("gpt-4o-mini").with_max_tokens(64),
//! );
//!
//! assert_eq!(request.messages().len(), 2);
//! assert!(request.options().validate().is_ok());
//! ```

mod accumulator;
mod error;
mod message;
mod messages;
mod options;
mod provider;
mod request;
mod response;
mod scripted;
mod stream;

pub mod prelude;

pub use accumulator::ResponseAccumulator;
pub use error::{MessageError, MessageErrorKind, ProviderError, ProviderErrorKind};
pub use message::{
    AssistantMessage, Media, MediaContent, Message, MessageKind, SystemMessage, ToolCall,
    ToolMessage, ToolReturn, UserMessage,
};
pub use messages::{
    MERGE_SEPARATOR, augment_last_of_kind, filter_by_kinds, first_index_of, has_kind_at,
    last_index_of, merge_adjacent_same_kind, merge_by_kind,
};
pub use options::{ModelOptions, ToolDefinition};
pub use provider::{ModelProvider, ProviderFuture};
pub use request::ChatRequest;
pub use response::{
    ChatResponse, FinishReason, Generation, GenerationMetadata, ResponseMetadata, TokenUsage,
};
pub use scripted::{ScriptedProvider, text_response, tool_call_response};
pub use stream::{ResponseStream, VecResponseStream};
