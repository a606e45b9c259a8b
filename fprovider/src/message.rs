//! Typed conversation messages.
//!
//! ```rust
//! use fprovider::{Message, MessageKind, ToolCall};
//!
//! let user = Message::user("What is 2 + 2?");
//! let assistant = Message::from(
//!     fprovider::AssistantMessage::new("").with_tool_calls(vec![ToolCall::new(
//!         "call_1",
//!         "calc",
//!         r#"{"expr":"2+2"}"#,
//!     )]),
//! );
//!
//! assert_eq!(user.kind(), MessageKind::User);
//! assert_eq!(user.text(), "What is 2 + 2?");
//! assert!(assistant.as_assistant().is_some_and(|message| message.has_tool_calls()));
//! ```

use std::fmt::{Display, Formatter};

use fcommon::MetadataMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::MessageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    System,
    User,
    Assistant,
    Tool,
}

impl Display for MessageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        };

        f.write_str(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MediaContent {
    Url(String),
    Inline(Vec<u8>),
}

/// Opaque attachment carried by user messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub mime_type: String,
    pub content: MediaContent,
}

impl Media {
    pub fn url(mime_type: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            content: MediaContent::Url(url.into()),
        }
    }

    pub fn inline(mime_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            content: MediaContent::Inline(bytes.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON-encoded arguments as produced by the model.
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolReturn {
    pub tool_call_id: String,
    pub name: String,
    pub result: String,
}

impl ToolReturn {
    pub fn new(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            result: result.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemMessage {
    pub text: String,
    #[serde(default, skip_serializing_if = "MetadataMap::is_empty")]
    pub metadata: MetadataMap,
}

impl SystemMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: MetadataMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserMessage {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<Media>,
    #[serde(default, skip_serializing_if = "MetadataMap::is_empty")]
    pub metadata: MetadataMap,
}

impl UserMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            media: Vec::new(),
            metadata: MetadataMap::new(),
        }
    }

    pub fn with_media(mut self, media: Vec<Media>) -> Self {
        self.media = media;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "MetadataMap::is_empty")]
    pub metadata: MetadataMap,
}

impl AssistantMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
            metadata: MetadataMap::new(),
        }
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Results of one or more tool calls. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolMessage {
    returns: Vec<ToolReturn>,
    #[serde(default, skip_serializing_if = "MetadataMap::is_empty")]
    pub metadata: MetadataMap,
}

impl ToolMessage {
    pub fn new(returns: Vec<ToolReturn>) -> Result<Self, MessageError> {
        if returns.is_empty() {
            return Err(MessageError::empty_input(
                "a tool message needs at least one tool return",
            ));
        }

        Ok(Self {
            returns,
            metadata: MetadataMap::new(),
        })
    }

    pub fn returns(&self) -> &[ToolReturn] {
        &self.returns
    }

    pub fn into_returns(self) -> Vec<ToolReturn> {
        self.returns
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    System(SystemMessage),
    User(UserMessage),
    Assistant(AssistantMessage),
    Tool(ToolMessage),
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self::System(SystemMessage::new(text))
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::User(UserMessage::new(text))
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant(AssistantMessage::new(text))
    }

    pub fn tool(returns: Vec<ToolReturn>) -> Result<Self, MessageError> {
        ToolMessage::new(returns).map(Self::Tool)
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Self::System(_) => MessageKind::System,
            Self::User(_) => MessageKind::User,
            Self::Assistant(_) => MessageKind::Assistant,
            Self::Tool(_) => MessageKind::Tool,
        }
    }

    /// Tool messages carry no text of their own and report an empty string.
    pub fn text(&self) -> &str {
        match self {
            Self::System(message) => &message.text,
            Self::User(message) => &message.text,
            Self::Assistant(message) => &message.text,
            Self::Tool(_) => "",
        }
    }

    pub fn metadata(&self) -> &MetadataMap {
        match self {
            Self::System(message) => &message.metadata,
            Self::User(message) => &message.metadata,
            Self::Assistant(message) => &message.metadata,
            Self::Tool(message) => &message.metadata,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata_mut().insert(key.into(), value.into());
        self
    }

    pub fn as_system(&self) -> Option<&SystemMessage> {
        match self {
            Self::System(message) => Some(message),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&UserMessage> {
        match self {
            Self::User(message) => Some(message),
            _ => None,
        }
    }

    pub fn as_assistant(&self) -> Option<&AssistantMessage> {
        match self {
            Self::Assistant(message) => Some(message),
            _ => None,
        }
    }

    pub fn as_tool(&self) -> Option<&ToolMessage> {
        match self {
            Self::Tool(message) => Some(message),
            _ => None,
        }
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut MetadataMap {
        match self {
            Self::System(message) => &mut message.metadata,
            Self::User(message) => &mut message.metadata,
            Self::Assistant(message) => &mut message.metadata,
            Self::Tool(message) => &mut message.metadata,
        }
    }
}

impl From<SystemMessage> for Message {
    fn from(value: SystemMessage) -> Self {
        Self::System(value)
    }
}

impl From<UserMessage> for Message {
    fn from(value: UserMessage) -> Self {
        Self::User(value)
    }
}

impl From<AssistantMessage> for Message {
    fn from(value: AssistantMessage) -> Self {
        Self::Assistant(value)
    }
}

impl From<ToolMessage> for Message {
    fn from(value: ToolMessage) -> Self {
        Self::Tool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageErrorKind;

    #[test]
    fn tool_message_rejects_empty_returns() {
        let error = ToolMessage::new(Vec::new()).expect_err("empty returns should fail");
        assert_eq!(error.kind, MessageErrorKind::EmptyInput);
    }

    #[test]
    fn with_metadata_adds_key_without_touching_text() {
        let message = Message::user("hi").with_metadata("lang", "en");

        assert_eq!(message.text(), "hi");
        assert_eq!(message.metadata().get("lang"), Some(&Value::from("en")));
    }

    #[test]
    fn tool_message_reports_empty_text() {
        let message = Message::tool(vec![ToolReturn::new("call_1", "calc", "4")])
            .expect("one return is enough");

        assert_eq!(message.kind(), MessageKind::Tool);
        assert_eq!(message.text(), "");
    }

    #[test]
    fn messages_serialize_with_kind_tag() {
        let encoded = serde_json::to_value(Message::system("be brief")).expect("encode");
        assert_eq!(encoded["kind"], "system");
        assert_eq!(encoded["text"], "be brief");

        let decoded: Message = serde_json::from_value(encoded).expect("decode");
        assert_eq!(decoded, Message::system("be brief"));
    }
}
