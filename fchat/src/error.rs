//! Chat-layer errors and classification.

use std::error::Error;
use std::fmt::{Display, Formatter};

use fcommon::{ContextError, ContextErrorKind};
use fprompt::PromptError;
use fprovider::{MessageError, ProviderError, ProviderErrorKind};
use ftooling::{ToolError, ToolErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    ModelRequired,
    EmptyMessages,
    InvalidConversationId,
    TemplateRenderFailed,
    JsonParseFailed,
    SensitiveInput,
    ToolNotRegistered,
    ToolExecutionFailed,
    InvalidToolCall,
    ToolRoundLimit,
    Provider,
    Cancelled,
    DeadlineExceeded,
    Store,
    Panicked,
    Other,
}

/// Stage of a turn in which the error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorPhase {
    Normalize,
    Middleware,
    Model,
    Tooling,
    Memory,
    Parse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSource {
    User,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatErrorSource {
    Provider(ProviderError),
    Tool(ToolError),
    Prompt(PromptError),
    Message(MessageError),
    Context(ContextError),
}

impl ChatErrorSource {
    fn as_error(&self) -> &(dyn Error + 'static) {
        match self {
            Self::Provider(error) => error,
            Self::Tool(error) => error,
            Self::Prompt(error) => error,
            Self::Message(error) => error,
            Self::Context(error) => error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub phase: Option<ChatErrorPhase>,
    pub message: String,
    pub template_source: Option<TemplateSource>,
    pub source: Option<ChatErrorSource>,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            phase: None,
            message: message.into(),
            template_source: None,
            source: None,
        }
    }

    pub fn model_required() -> Self {
        Self::new(
            ChatErrorKind::ModelRequired,
            "model options must name a model",
        )
        .with_phase(ChatErrorPhase::Normalize)
    }

    pub fn empty_messages() -> Self {
        Self::new(
            ChatErrorKind::EmptyMessages,
            "request must contain at least one message",
        )
        .with_phase(ChatErrorPhase::Normalize)
    }

    pub fn invalid_conversation_id(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidConversationId, message)
    }

    pub fn template_render_failed(template: TemplateSource, cause: PromptError) -> Self {
        let label = match template {
            TemplateSource::User => "user",
            TemplateSource::System => "system",
        };

        let mut error = Self::new(
            ChatErrorKind::TemplateRenderFailed,
            format!("failed to render {label} template: {}", cause.message),
        )
        .with_phase(ChatErrorPhase::Normalize)
        .with_source(ChatErrorSource::Prompt(cause));
        error.template_source = Some(template);
        error
    }

    pub fn sensitive_input(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::SensitiveInput, message).with_phase(ChatErrorPhase::Middleware)
    }

    pub fn tool_round_limit(limit: usize) -> Self {
        Self::new(
            ChatErrorKind::ToolRoundLimit,
            format!("tool loop exceeded {limit} round trips"),
        )
        .with_phase(ChatErrorPhase::Tooling)
    }

    pub fn panicked(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Panicked, message).with_phase(ChatErrorPhase::Middleware)
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Store, message).with_phase(ChatErrorPhase::Memory)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Other, message)
    }

    pub fn with_phase(mut self, phase: ChatErrorPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn with_source(mut self, source: ChatErrorSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(
            self.kind,
            ChatErrorKind::Cancelled | ChatErrorKind::DeadlineExceeded
        )
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.phase {
            Some(phase) => write!(f, "{:?} [{:?}]: {}", self.kind, phase, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ChatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_ref().map(ChatErrorSource::as_error)
    }
}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        let kind = match value.kind {
            ProviderErrorKind::Cancelled => ChatErrorKind::Cancelled,
            ProviderErrorKind::DeadlineExceeded => ChatErrorKind::DeadlineExceeded,
            _ => ChatErrorKind::Provider,
        };

        Self::new(kind, value.to_string())
            .with_phase(ChatErrorPhase::Model)
            .with_source(ChatErrorSource::Provider(value))
    }
}

impl From<ToolError> for ChatError {
    fn from(value: ToolError) -> Self {
        let kind = match (value.kind, value.context) {
            (ToolErrorKind::Cancelled, Some(ContextErrorKind::DeadlineExceeded)) => {
                ChatErrorKind::DeadlineExceeded
            }
            (ToolErrorKind::Cancelled, _) => ChatErrorKind::Cancelled,
            (ToolErrorKind::NotRegistered, _) => ChatErrorKind::ToolNotRegistered,
            (ToolErrorKind::InvalidToolCall, _) => ChatErrorKind::InvalidToolCall,
            (ToolErrorKind::Execution | ToolErrorKind::InvalidArguments, _) => {
                ChatErrorKind::ToolExecutionFailed
            }
            (ToolErrorKind::InvalidDefinition | ToolErrorKind::Other, _) => ChatErrorKind::Other,
        };

        Self::new(kind, value.to_string())
            .with_phase(ChatErrorPhase::Tooling)
            .with_source(ChatErrorSource::Tool(value))
    }
}

impl From<PromptError> for ChatError {
    fn from(value: PromptError) -> Self {
        let kind = match value.kind {
            fprompt::PromptErrorKind::JsonParseFailed => ChatErrorKind::JsonParseFailed,
            _ => ChatErrorKind::Other,
        };

        Self::new(kind, value.to_string())
            .with_phase(ChatErrorPhase::Parse)
            .with_source(ChatErrorSource::Prompt(value))
    }
}

impl From<MessageError> for ChatError {
    fn from(value: MessageError) -> Self {
        Self::new(ChatErrorKind::Other, value.to_string())
            .with_phase(ChatErrorPhase::Normalize)
            .with_source(ChatErrorSource::Message(value))
    }
}

impl From<ContextError> for ChatError {
    fn from(value: ContextError) -> Self {
        let kind = match value.kind {
            ContextErrorKind::Cancelled => ChatErrorKind::Cancelled,
            ContextErrorKind::DeadlineExceeded => ChatErrorKind::DeadlineExceeded,
        };

        Self::new(kind, value.to_string()).with_source(ChatErrorSource::Context(value))
    }
}
