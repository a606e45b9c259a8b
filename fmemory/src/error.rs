//! Memory-layer errors for conversation persistence operations.

use std::error::Error;
use std::fmt::{Display, Formatter};

use fchat::{ChatError, ChatErrorKind, ChatErrorPhase};
use fcommon::{ContextError, ContextErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryErrorKind {
    Storage,
    InvalidRequest,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryError {
    pub kind: MemoryErrorKind,
    pub message: String,
    /// Set when the operation was abandoned because its call context ended.
    pub context: Option<ContextErrorKind>,
}

impl MemoryError {
    pub fn new(kind: MemoryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: None,
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(MemoryErrorKind::Storage, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(MemoryErrorKind::InvalidRequest, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(MemoryErrorKind::Other, message)
    }
}

impl Display for MemoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for MemoryError {}

impl From<ContextError> for MemoryError {
    fn from(value: ContextError) -> Self {
        let mut error = Self::other(value.to_string());
        error.context = Some(value.kind);
        error
    }
}

impl From<MemoryError> for ChatError {
    fn from(value: MemoryError) -> Self {
        let kind = match (value.kind, value.context) {
            (_, Some(ContextErrorKind::Cancelled)) => ChatErrorKind::Cancelled,
            (_, Some(ContextErrorKind::DeadlineExceeded)) => ChatErrorKind::DeadlineExceeded,
            (MemoryErrorKind::InvalidRequest, None) => ChatErrorKind::InvalidConversationId,
            (MemoryErrorKind::Storage | MemoryErrorKind::Other, None) => ChatErrorKind::Store,
        };

        ChatError::new(kind, value.to_string()).with_phase(ChatErrorPhase::Memory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_errors_map_to_chat_kinds() {
        let error = ChatError::from(MemoryError::storage("disk full"));
        assert_eq!(error.kind, ChatErrorKind::Store);
        assert_eq!(error.phase, Some(ChatErrorPhase::Memory));
        assert_eq!(error.message, "Storage: disk full");

        let error = ChatError::from(MemoryError::invalid_request("bad id"));
        assert_eq!(error.kind, ChatErrorKind::InvalidConversationId);

        let error = ChatError::from(MemoryError::from(ContextError::cancelled()));
        assert_eq!(error.kind, ChatErrorKind::Cancelled);
    }
}
