//! Per-request prompt builder and the deferred call surface.

use std::collections::HashMap;
use std::sync::Arc;

use fcommon::{BoxStream, CallContext, ConversationId, MetadataMap, ParamBag};
use fprompt::{
    JsonParser, ListParser, MapParser, StructuredParser, SystemPromptTemplate, UserPromptTemplate,
};
use fprovider::{ChatRequest, ChatResponse, Message, ModelOptions};
use futures_util::StreamExt;
use futures_util::future::ready;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::ClientConfig;
use crate::params::{set_conversation_id, set_output_format};
use crate::turn::{run_call, run_stream};
use crate::{ChatError, ChatStream, normalize_messages};

/// One request against a [`ChatClient`](crate::ChatClient).
///
/// Prompt-level settings are layered over the client defaults: messages are appended after
/// the default messages, templates and options replace the defaults, and parameters are
/// merged with prompt values winning.
pub struct ChatPrompt {
    config: Arc<ClientConfig>,
    messages: Vec<Message>,
    system_template: Option<SystemPromptTemplate>,
    user_template: Option<UserPromptTemplate>,
    vars: MetadataMap,
    options: Option<ModelOptions>,
    params: MetadataMap,
    conversation_id: Option<ConversationId>,
}

impl ChatPrompt {
    pub(crate) fn new(config: Arc<ClientConfig>) -> Self {
        Self {
            config,
            messages: Vec::new(),
            system_template: None,
            user_template: None,
            vars: MetadataMap::new(),
            options: None,
            params: MetadataMap::new(),
            conversation_id: None,
        }
    }

    pub fn system(mut self, text: impl Into<String>) -> Self {
        self.messages.push(Message::system(text));
        self
    }

    pub fn system_template(mut self, template: SystemPromptTemplate) -> Self {
        self.system_template = Some(template);
        self
    }

    pub fn user(mut self, text: impl Into<String>) -> Self {
        self.messages.push(Message::user(text));
        self
    }

    /// Rendered only when the prompt ends up with no messages at all.
    pub fn user_template(mut self, template: UserPromptTemplate) -> Self {
        self.user_template = Some(template);
        self
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Binds a template variable shared by the user and system templates.
    pub fn var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn options(mut self, options: ModelOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn conversation_id(mut self, id: impl Into<ConversationId>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    /// Builds the normalized request this prompt would send into the middleware chain.
    pub fn request(&self) -> Result<ChatRequest, ChatError> {
        let config = &self.config;

        let mut messages = config.messages.clone();
        messages.extend(self.messages.iter().cloned());
        let messages = normalize_messages(
            &messages,
            self.user_template
                .as_ref()
                .or(config.user_template.as_ref()),
            self.system_template
                .as_ref()
                .or(config.system_template.as_ref()),
            &self.vars,
        )?;

        let mut options = self
            .options
            .clone()
            .unwrap_or_else(|| config.options.clone());
        if !options.has_model() {
            return Err(ChatError::model_required());
        }
        if options.tools.is_empty() && !config.registry.is_empty() {
            options.tools = config.registry.definitions();
        }

        let params = ParamBag::from_map(config.params.clone());
        params.extend(self.params.clone());
        if let Some(id) = &self.conversation_id {
            set_conversation_id(&params, id.clone());
        }

        Ok(ChatRequest::new(messages, options).with_params(params))
    }

    /// Defers execution until one of the [`CallResponse`] accessors is awaited.
    pub fn call(self, ctx: CallContext) -> CallResponse {
        CallResponse { prompt: self, ctx }
    }

    pub fn stream(self, ctx: CallContext) -> ChatStream {
        match self.request() {
            Ok(request) => run_stream(Arc::clone(&self.config), ctx, request),
            Err(error) => Box::pin(futures_util::stream::once(async move { Err(error) })),
        }
    }

    /// Text deltas of [`ChatPrompt::stream`]; chunks without text are skipped.
    pub fn stream_text(self, ctx: CallContext) -> BoxStream<'static, Result<String, ChatError>> {
        Box::pin(
            self.stream(ctx)
                .map(|chunk| chunk.map(|response| response.text().to_string()))
                .filter(|item| ready(!matches!(item, Ok(text) if text.is_empty()))),
        )
    }
}

impl std::fmt::Debug for ChatPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatPrompt")
            .field("messages", &self.messages)
            .field("options", &self.options)
            .field("conversation_id", &self.conversation_id)
            .finish_non_exhaustive()
    }
}

/// Pending blocking call. Structured accessors add their parser's format instructions to
/// the request before it is sent.
#[derive(Debug)]
pub struct CallResponse {
    prompt: ChatPrompt,
    ctx: CallContext,
}

impl CallResponse {
    pub async fn response(self) -> Result<ChatResponse, ChatError> {
        self.execute(None).await
    }

    pub async fn text(self) -> Result<String, ChatError> {
        Ok(self.response().await?.text().to_string())
    }

    pub async fn list(self) -> Result<Vec<String>, ChatError> {
        self.parse_with(&ListParser).await
    }

    pub async fn map(self) -> Result<HashMap<String, Value>, ChatError> {
        self.parse_with(&MapParser).await
    }

    pub async fn entity<T>(self) -> Result<T, ChatError>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let parser = JsonParser::<T>::new()?;
        self.parse_with(&parser).await
    }

    pub async fn parse_with<T, P>(self, parser: &P) -> Result<T, ChatError>
    where
        P: StructuredParser<T> + ?Sized,
    {
        let response = self.execute(Some(parser.instructions())).await?;
        parser.parse(response.text()).map_err(ChatError::from)
    }

    async fn execute(self, instructions: Option<String>) -> Result<ChatResponse, ChatError> {
        let request = self.prompt.request()?;
        if let Some(instructions) = instructions.filter(|text| !text.is_empty()) {
            set_output_format(request.params(), instructions);
        }

        run_call(Arc::clone(&self.prompt.config), self.ctx, request).await
    }
}
