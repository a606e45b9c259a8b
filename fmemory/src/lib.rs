//! Conversation memory: a pluggable message store and the middleware that keeps it current.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use fchat::ChatClient;
//! use fmemory::MemoryMiddleware;
//! use fprovider::{ModelOptions, ScriptedProvider};
//!
//! let memory = MemoryMiddleware::new();
//! let client = ChatClient::builder(Arc::new(ScriptedProvider::new()))
//!     .default_options(ModelOptions::new("demo-model"))
//!     .call_middleware(memory.clone())
//!     .stream_middleware(memory)
//!     .build()
//!     .expect("model is configured");
//!
//! assert_eq!(client.call_middleware_count(), 1);
//! ```

mod error;
mod middleware;
mod store;

pub mod prelude {
    pub use crate::{
        ConversationMemory, InMemoryConversationMemory, MemoryError, MemoryErrorKind,
        MemoryMiddleware, is_saved,
    };
}

pub use error::{MemoryError, MemoryErrorKind};
pub use middleware::{MemoryMiddleware, SAVED_MARKER, is_saved, mark_saved};
pub use store::{ConversationMemory, InMemoryConversationMemory};
