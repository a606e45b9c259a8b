use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptErrorKind {
    MissingVariable,
    InvalidTemplate,
    JsonParseFailed,
    Schema,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptError {
    pub kind: PromptErrorKind,
    pub message: String,
    /// Placeholder name for `MissingVariable` errors.
    pub variable: Option<String>,
}

impl PromptError {
    pub fn new(kind: PromptErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            variable: None,
        }
    }

    pub fn missing_variable(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: PromptErrorKind::MissingVariable,
            message: format!("no value supplied for template variable '{name}'"),
            variable: Some(name),
        }
    }

    pub fn invalid_template(message: impl Into<String>) -> Self {
        Self::new(PromptErrorKind::InvalidTemplate, message)
    }

    pub fn json_parse_failed(message: impl Into<String>) -> Self {
        Self::new(PromptErrorKind::JsonParseFailed, message)
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::new(PromptErrorKind::Schema, message)
    }
}

impl Display for PromptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for PromptError {}
