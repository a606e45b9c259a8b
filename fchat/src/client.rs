//! Chat client configuration and the per-request prompt builder.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use fcommon::CallContext;
//! use fchat::ChatClient;
//! use fprovider::{ModelOptions, ScriptedProvider};
//!
//! # tokio_test_block_on(async {
//! let provider = Arc::new(ScriptedProvider::new());
//! provider.push_text("Hi there");
//!
//! let client = ChatClient::builder(provider.clone())
//!     .default_options(ModelOptions::new("demo-model"))
//!     .build()
//!     .expect("model is configured");
//!
//! let text = client
//!     .prompt()
//!     .user("Hi")
//!     .call(CallContext::new())
//!     .text()
//!     .await
//!     .expect("scripted reply");
//!
//! assert_eq!(text, "Hi there");
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(future: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(future)
//! # }
//! ```

use std::sync::Arc;

use fcommon::MetadataMap;
use fprompt::{SystemPromptTemplate, UserPromptTemplate};
use fprovider::{Message, ModelOptions, ModelProvider};
use ftooling::{NoopToolRuntimeHooks, ToolRegistry, ToolRuntimeHooks};
use serde_json::Value;

use crate::{
    CallHandler, CallMiddleware, ChatError, ChatPrompt, ModelInvoker, StreamHandler,
    StreamMiddleware, chain_call, chain_stream,
};

/// Limits applied to a single conversational turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatPolicy {
    /// Maximum number of times the tool dispatcher may send a turn back to the model.
    pub max_tool_round_trips: usize,
}

impl ChatPolicy {
    pub fn new(max_tool_round_trips: usize) -> Self {
        Self {
            max_tool_round_trips,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }
}

impl Default for ChatPolicy {
    fn default() -> Self {
        Self::new(16)
    }
}

pub(crate) struct ClientConfig {
    pub(crate) provider: Arc<dyn ModelProvider>,
    pub(crate) options: ModelOptions,
    pub(crate) system_template: Option<SystemPromptTemplate>,
    pub(crate) user_template: Option<UserPromptTemplate>,
    pub(crate) messages: Vec<Message>,
    pub(crate) params: MetadataMap,
    pub(crate) call_middlewares: Vec<Arc<dyn CallMiddleware>>,
    pub(crate) stream_middlewares: Vec<Arc<dyn StreamMiddleware>>,
    pub(crate) registry: Arc<ToolRegistry>,
    pub(crate) tool_hooks: Arc<dyn ToolRuntimeHooks>,
    pub(crate) policy: ChatPolicy,
    pub(crate) call_chain: CallHandler,
    pub(crate) stream_chain: StreamHandler,
}

/// Immutable, cheaply clonable chat client.
///
/// The middleware chains are composed once in [`ChatClientBuilder::build`] and shared by
/// every prompt issued from this client.
#[derive(Clone)]
pub struct ChatClient {
    config: Arc<ClientConfig>,
}

impl ChatClient {
    pub fn builder(provider: Arc<dyn ModelProvider>) -> ChatClientBuilder {
        ChatClientBuilder::new(provider)
    }

    pub fn prompt(&self) -> ChatPrompt {
        ChatPrompt::new(Arc::clone(&self.config))
    }

    /// Forks this client's configuration into a fresh builder.
    pub fn mutate(&self) -> ChatClientBuilder {
        let config = &self.config;
        ChatClientBuilder {
            provider: Arc::clone(&config.provider),
            options: Some(config.options.clone()),
            system_template: config.system_template.clone(),
            user_template: config.user_template.clone(),
            messages: config.messages.clone(),
            params: config.params.clone(),
            call_middlewares: config.call_middlewares.clone(),
            stream_middlewares: config.stream_middlewares.clone(),
            registry: Some(Arc::clone(&config.registry)),
            tool_hooks: Arc::clone(&config.tool_hooks),
            policy: config.policy,
        }
    }

    pub fn options(&self) -> &ModelOptions {
        &self.config.options
    }

    pub fn policy(&self) -> ChatPolicy {
        self.config.policy
    }

    pub fn tool_registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.config.registry)
    }

    pub fn call_middleware_count(&self) -> usize {
        self.config.call_middlewares.len()
    }

    pub fn stream_middleware_count(&self) -> usize {
        self.config.stream_middlewares.len()
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("options", &self.config.options)
            .field("policy", &self.config.policy)
            .field("call_middlewares", &self.config.call_middlewares.len())
            .field("stream_middlewares", &self.config.stream_middlewares.len())
            .finish_non_exhaustive()
    }
}

pub struct ChatClientBuilder {
    provider: Arc<dyn ModelProvider>,
    options: Option<ModelOptions>,
    system_template: Option<SystemPromptTemplate>,
    user_template: Option<UserPromptTemplate>,
    messages: Vec<Message>,
    params: MetadataMap,
    call_middlewares: Vec<Arc<dyn CallMiddleware>>,
    stream_middlewares: Vec<Arc<dyn StreamMiddleware>>,
    registry: Option<Arc<ToolRegistry>>,
    tool_hooks: Arc<dyn ToolRuntimeHooks>,
    policy: ChatPolicy,
}

impl ChatClientBuilder {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            options: None,
            system_template: None,
            user_template: None,
            messages: Vec::new(),
            params: MetadataMap::new(),
            call_middlewares: Vec::new(),
            stream_middlewares: Vec::new(),
            registry: None,
            tool_hooks: Arc::new(NoopToolRuntimeHooks),
            policy: ChatPolicy::default(),
        }
    }

    /// Replaces the provider's default options.
    pub fn default_options(mut self, options: ModelOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn default_system(self, text: impl Into<String>) -> Self {
        self.default_system_template(SystemPromptTemplate::new(text))
    }

    pub fn default_system_template(mut self, template: SystemPromptTemplate) -> Self {
        self.system_template = Some(template);
        self
    }

    pub fn default_user(self, text: impl Into<String>) -> Self {
        self.default_user_template(UserPromptTemplate::new(text))
    }

    pub fn default_user_template(mut self, template: UserPromptTemplate) -> Self {
        self.user_template = Some(template);
        self
    }

    /// Messages placed before every prompt's own messages.
    pub fn default_messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn default_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn call_middleware<M>(mut self, middleware: M) -> Self
    where
        M: CallMiddleware + 'static,
    {
        self.call_middlewares.push(Arc::new(middleware));
        self
    }

    pub fn call_middleware_arc(mut self, middleware: Arc<dyn CallMiddleware>) -> Self {
        self.call_middlewares.push(middleware);
        self
    }

    pub fn stream_middleware<M>(mut self, middleware: M) -> Self
    where
        M: StreamMiddleware + 'static,
    {
        self.stream_middlewares.push(Arc::new(middleware));
        self
    }

    pub fn stream_middleware_arc(mut self, middleware: Arc<dyn StreamMiddleware>) -> Self {
        self.stream_middlewares.push(middleware);
        self
    }

    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn tool_hooks(mut self, hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.tool_hooks = hooks;
        self
    }

    pub fn policy(mut self, policy: ChatPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Result<ChatClient, ChatError> {
        let options = self
            .options
            .unwrap_or_else(|| self.provider.default_options());
        if !options.has_model() {
            return Err(ChatError::model_required());
        }

        let invoker = ModelInvoker::new(Arc::clone(&self.provider));
        let call_chain = chain_call(&self.call_middlewares, invoker.call_handler());
        let stream_chain = chain_stream(&self.stream_middlewares, invoker.stream_handler());

        Ok(ChatClient {
            config: Arc::new(ClientConfig {
                provider: self.provider,
                options,
                system_template: self.system_template,
                user_template: self.user_template,
                messages: self.messages,
                params: self.params,
                call_middlewares: self.call_middlewares,
                stream_middlewares: self.stream_middlewares,
                registry: self.registry.unwrap_or_else(ToolRegistry::global),
                tool_hooks: self.tool_hooks,
                policy: self.policy,
                call_chain,
                stream_chain,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use fprovider::ScriptedProvider;

    use super::*;
    use crate::{ChatErrorKind, RecoverMiddleware, SafeguardMiddleware};

    #[test]
    fn build_requires_a_model_name() {
        let provider = Arc::new(ScriptedProvider::new());
        let error = ChatClient::builder(provider)
            .default_options(ModelOptions::default())
            .build()
            .expect_err("model missing");

        assert_eq!(error.kind, ChatErrorKind::ModelRequired);
    }

    #[test]
    fn provider_defaults_apply_when_no_options_are_given() {
        let client = ChatClient::builder(Arc::new(ScriptedProvider::new()))
            .build()
            .expect("scripted provider names a model");

        assert_eq!(client.options().model, "scripted-model");
        assert_eq!(client.policy(), ChatPolicy::default());
    }

    #[test]
    fn mutate_forks_without_touching_the_origin() {
        let origin = ChatClient::builder(Arc::new(ScriptedProvider::new()))
            .call_middleware(RecoverMiddleware)
            .stream_middleware(RecoverMiddleware)
            .build()
            .expect("valid");

        let fork = origin
            .mutate()
            .call_middleware(SafeguardMiddleware::new(["secret"]))
            .policy(ChatPolicy::unbounded())
            .build()
            .expect("valid");

        assert_eq!(origin.call_middleware_count(), 1);
        assert_eq!(fork.call_middleware_count(), 2);
        assert_eq!(fork.stream_middleware_count(), 1);
        assert_eq!(origin.policy().max_tool_round_trips, 16);
        assert_eq!(fork.policy().max_tool_round_trips, usize::MAX);
    }
}
