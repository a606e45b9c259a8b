//! Observability for chat turns: tracing and metrics middlewares plus tool runtime hooks.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use fchat::ChatClient;
//! use fobserve::{MetricsMiddleware, SafeToolHooks, TracingMiddleware, TracingToolHooks};
//! use fprovider::{ModelOptions, ScriptedProvider};
//!
//! let client = ChatClient::builder(Arc::new(ScriptedProvider::new()))
//!     .default_options(ModelOptions::new("gpt-4o-mini"))
//!     .call_middleware(TracingMiddleware)
//!     .call_middleware(MetricsMiddleware)
//!     .stream_middleware(TracingMiddleware)
//!     .tool_hooks(Arc::new(SafeToolHooks::new(TracingToolHooks)))
//!     .build()
//!     .expect("client builds");
//!
//! assert_eq!(client.call_middleware_count(), 2);
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::{MetricsMiddleware, MetricsToolHooks};
pub use safe_hooks::SafeToolHooks;
pub use tracing_hooks::{TracingMiddleware, TracingToolHooks};

pub mod prelude {
    pub use crate::{
        MetricsMiddleware, MetricsToolHooks, SafeToolHooks, TracingMiddleware, TracingToolHooks,
    };
}
