//! In-memory provider that replays queued responses.
//!
//! ```rust
//! use fcommon::CallContext;
//! use fprovider::{ChatRequest, Message, ModelOptions, ModelProvider, ScriptedProvider};
//!
//! # tokio_test_block_on(async {
//! let provider = ScriptedProvider::new();
//! provider.push_text("hi there");
//!
//! let request = ChatRequest::new(vec![Message::user("hello")], ModelOptions::new("m"));
//! let response = provider.call(CallContext::new(), request).await.expect("scripted reply");
//!
//! assert_eq!(response.text(), "hi there");
//! assert_eq!(provider.request_count(), 1);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(future: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(future)
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use fcommon::CallContext;
use futures_util::StreamExt;
use futures_util::stream;

use crate::{
    AssistantMessage, ChatRequest, ChatResponse, FinishReason, Generation, ModelOptions,
    ModelProvider, ProviderError, ProviderFuture, ResponseStream, ToolCall,
};

type Scripted = Result<ChatResponse, ProviderError>;

/// Provider double used by tests and demos.
///
/// Call replies and stream scripts are consumed in FIFO order. A stream request with no
/// queued script falls back to the next call reply as a single chunk. Every request is
/// recorded before the reply is produced.
#[derive(Debug)]
pub struct ScriptedProvider {
    options: ModelOptions,
    replies: Mutex<VecDeque<Scripted>>,
    streams: Mutex<VecDeque<Vec<Scripted>>>,
    requests: Mutex<Vec<ChatRequest>>,
    delay: Option<Duration>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            options: ModelOptions::new("scripted-model"),
            replies: Mutex::new(VecDeque::new()),
            streams: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_default_options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    /// Makes every call wait before replying so cancellation can win the race.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_call(&self, reply: Result<ChatResponse, ProviderError>) {
        lock(&self.replies).push_back(reply);
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.push_call(Ok(text_response(text)));
    }

    pub fn push_tool_calls(&self, calls: Vec<ToolCall>) {
        self.push_call(Ok(tool_call_response(calls)));
    }

    pub fn push_stream(&self, chunks: Vec<Result<ChatResponse, ProviderError>>) {
        lock(&self.streams).push_back(chunks);
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        lock(&self.requests).last().cloned()
    }

    fn record(&self, request: ChatRequest) {
        lock(&self.requests).push(request);
    }

    fn next_reply(&self) -> Scripted {
        lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::unavailable("no scripted reply queued")))
    }
}

impl ModelProvider for ScriptedProvider {
    fn default_options(&self) -> ModelOptions {
        self.options.clone()
    }

    fn call<'a>(
        &'a self,
        ctx: CallContext,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<ChatResponse, ProviderError>> {
        Box::pin(async move {
            ctx.check()?;
            self.record(request);

            if let Some(delay) = self.delay {
                ctx.run(tokio::time::sleep(delay)).await?;
            }

            self.next_reply()
        })
    }

    fn stream<'a>(&'a self, ctx: CallContext, request: ChatRequest) -> ResponseStream<'a> {
        if let Err(error) = ctx.check() {
            return Box::pin(stream::iter(vec![Err(ProviderError::from(error))]));
        }

        self.record(request);
        let chunks = lock(&self.streams)
            .pop_front()
            .unwrap_or_else(|| vec![self.next_reply()]);

        Box::pin(stream::iter(chunks).then(move |chunk| {
            let ctx = ctx.clone();
            async move {
                ctx.check()?;
                chunk
            }
        }))
    }
}

pub fn text_response(text: impl Into<String>) -> ChatResponse {
    ChatResponse::new(vec![
        Generation::new(AssistantMessage::new(text)).with_finish_reason(FinishReason::Stop),
    ])
}

pub fn tool_call_response(calls: Vec<ToolCall>) -> ChatResponse {
    ChatResponse::new(vec![
        Generation::new(AssistantMessage::new("").with_tool_calls(calls))
            .with_finish_reason(FinishReason::ToolCalls),
    ])
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
