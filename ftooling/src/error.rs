//! Tool execution errors and classifications.

use std::error::Error;
use std::fmt::{Display, Formatter};

use fcommon::{ContextError, ContextErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    NotRegistered,
    InvalidToolCall,
    InvalidDefinition,
    InvalidArguments,
    Execution,
    Cancelled,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
    pub tool_name: Option<String>,
    pub tool_call_id: Option<String>,
    /// Set for cancellations so callers can tell a deadline from an explicit cancel.
    pub context: Option<ContextErrorKind>,
    cause: Option<Box<ToolError>>,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            tool_name: None,
            tool_call_id: None,
            context: None,
            cause: None,
        }
    }

    pub fn not_registered(tool_name: impl Into<String>) -> Self {
        let tool_name = tool_name.into();
        Self::new(
            ToolErrorKind::NotRegistered,
            format!("tool '{tool_name}' is not registered"),
        )
        .with_tool_name(tool_name)
    }

    pub fn invalid_tool_call(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidToolCall, message)
    }

    pub fn invalid_definition(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidDefinition, message)
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidArguments, message)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Execution, message)
    }

    /// Wraps the failure of a named tool, keeping the original error as the cause.
    pub fn execution_failed(tool_name: impl Into<String>, cause: ToolError) -> Self {
        let tool_name = tool_name.into();
        let mut error = Self::new(
            ToolErrorKind::Execution,
            format!("tool '{tool_name}' failed: {}", cause.message),
        )
        .with_tool_name(tool_name);
        error.cause = Some(Box::new(cause));
        error
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Cancelled, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Other, message)
    }

    pub fn with_tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    pub fn with_tool_call_id(mut self, tool_call_id: impl Into<String>) -> Self {
        self.tool_call_id = Some(tool_call_id.into());
        self
    }

    pub fn cause(&self) -> Option<&ToolError> {
        self.cause.as_deref()
    }

    pub fn is_user_error(&self) -> bool {
        matches!(
            self.kind,
            ToolErrorKind::InvalidArguments
                | ToolErrorKind::NotRegistered
                | ToolErrorKind::InvalidToolCall
        )
    }
}

impl Display for ToolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.tool_name, &self.tool_call_id) {
            (Some(tool_name), Some(tool_call_id)) => write!(
                f,
                "{:?} [tool={}, call_id={}]: {}",
                self.kind, tool_name, tool_call_id, self.message
            ),
            (Some(tool_name), None) => {
                write!(f, "{:?} [tool={}]: {}", self.kind, tool_name, self.message)
            }
            _ => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ToolError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn Error + 'static))
    }
}

impl From<ContextError> for ToolError {
    fn from(value: ContextError) -> Self {
        let mut error = Self::cancelled(value.to_string());
        error.context = Some(value.kind);
        error
    }
}
