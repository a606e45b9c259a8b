//! Model responses.
//!
//! ```rust
//! use fprovider::{AssistantMessage, ChatResponse, FinishReason, Generation};
//!
//! let response = ChatResponse::new(vec![
//!     Generation::new(AssistantMessage::new("hello")).with_finish_reason(FinishReason::Stop),
//! ]);
//!
//! assert_eq!(response.text(), "hello");
//! assert!(!response.has_tool_calls());
//! ```

use fcommon::{MetadataMap, ParamBag};
use serde::{Deserialize, Serialize};

use crate::{AssistantMessage, ToolCall, ToolMessage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    /// Tool results were returned straight to the caller without another model turn.
    ReturnDirect,
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub finish_reason: Option<FinishReason>,
    #[serde(default, skip_serializing_if = "MetadataMap::is_empty")]
    pub extra: MetadataMap,
}

/// One candidate produced by the model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Generation {
    pub assistant: AssistantMessage,
    /// Filled by the tool dispatcher when it synthesizes a terminal response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_message: Option<ToolMessage>,
    #[serde(default)]
    pub metadata: GenerationMetadata,
}

impl Generation {
    pub fn new(assistant: AssistantMessage) -> Self {
        Self {
            assistant,
            tool_message: None,
            metadata: GenerationMetadata::default(),
        }
    }

    pub fn with_tool_message(mut self, tool_message: ToolMessage) -> Self {
        self.tool_message = Some(tool_message);
        self
    }

    pub fn with_finish_reason(mut self, finish_reason: FinishReason) -> Self {
        self.metadata.finish_reason = Some(finish_reason);
        self
    }

    pub fn finish_reason(&self) -> Option<&FinishReason> {
        self.metadata.finish_reason.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub id: Option<String>,
    pub model: Option<String>,
    pub usage: Option<TokenUsage>,
    #[serde(default, skip_serializing_if = "MetadataMap::is_empty")]
    pub extra: MetadataMap,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatResponse {
    results: Vec<Generation>,
    pub metadata: ResponseMetadata,
    params: ParamBag,
}

impl ChatResponse {
    pub fn new(results: Vec<Generation>) -> Self {
        Self {
            results,
            metadata: ResponseMetadata::default(),
            params: ParamBag::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: ResponseMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_params(mut self, params: ParamBag) -> Self {
        self.params = params;
        self
    }

    /// First result, if the model produced any.
    pub fn result(&self) -> Option<&Generation> {
        self.results.first()
    }

    pub fn results(&self) -> &[Generation] {
        &self.results
    }

    pub fn into_results(self) -> Vec<Generation> {
        self.results
    }

    pub fn params(&self) -> &ParamBag {
        &self.params
    }

    /// Text of the first result, or an empty string.
    pub fn text(&self) -> &str {
        self.result()
            .map(|result| result.assistant.text.as_str())
            .unwrap_or_default()
    }

    pub fn has_tool_calls(&self) -> bool {
        self.results
            .iter()
            .any(|result| result.assistant.has_tool_calls())
    }

    /// Tool calls of the first result that carries any.
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.results
            .iter()
            .find(|result| result.assistant.has_tool_calls())
            .map(|result| result.assistant.tool_calls.as_slice())
            .unwrap_or_default()
    }

    pub fn finish_reason(&self) -> Option<&FinishReason> {
        self.result().and_then(Generation::finish_reason)
    }
}
