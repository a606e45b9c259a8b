//! Folds streamed response chunks into one response.
//!
//! ```rust
//! use fprovider::{AssistantMessage, ChatResponse, Generation, ResponseAccumulator};
//!
//! let mut accumulator = ResponseAccumulator::new();
//! accumulator.push(&ChatResponse::new(vec![Generation::new(AssistantMessage::new("Hel"))]));
//! accumulator.push(&ChatResponse::new(vec![Generation::new(AssistantMessage::new("lo"))]));
//!
//! assert_eq!(accumulator.finish().text(), "Hello");
//! ```

use fcommon::ParamBag;

use crate::{ChatResponse, Generation, ResponseMetadata, ToolCall};

#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    results: Vec<Generation>,
    metadata: ResponseMetadata,
    params: ParamBag,
    chunks: usize,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    pub fn is_empty(&self) -> bool {
        self.chunks == 0
    }

    pub fn push(&mut self, chunk: &ChatResponse) {
        self.chunks += 1;

        for (index, generation) in chunk.results().iter().enumerate() {
            if self.results.len() <= index {
                self.results.resize_with(index + 1, Generation::default);
            }

            merge_generation(&mut self.results[index], generation);
        }

        let metadata = &chunk.metadata;
        if metadata.id.is_some() {
            self.metadata.id = metadata.id.clone();
        }
        if metadata.model.is_some() {
            self.metadata.model = metadata.model.clone();
        }
        if metadata.usage.is_some() {
            self.metadata.usage = metadata.usage;
        }
        self.metadata.extra.extend(
            metadata
                .extra
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );

        self.params.extend(chunk.params().snapshot());
    }

    pub fn finish(self) -> ChatResponse {
        ChatResponse::new(self.results)
            .with_metadata(self.metadata)
            .with_params(self.params)
    }
}

fn merge_generation(target: &mut Generation, chunk: &Generation) {
    target.assistant.text.push_str(&chunk.assistant.text);
    target.assistant.metadata.extend(
        chunk
            .assistant
            .metadata
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );

    for call in &chunk.assistant.tool_calls {
        merge_tool_call(&mut target.assistant.tool_calls, call);
    }

    if chunk.tool_message.is_some() {
        target.tool_message = chunk.tool_message.clone();
    }

    if chunk.metadata.finish_reason.is_some() {
        target.metadata.finish_reason = chunk.metadata.finish_reason.clone();
    }
    target.metadata.extra.extend(
        chunk
            .metadata
            .extra
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );
}

/// Argument fragments are joined by call id; a fragment without an id continues the
/// most recent call.
fn merge_tool_call(calls: &mut Vec<ToolCall>, fragment: &ToolCall) {
    let existing = if fragment.id.is_empty() {
        calls.last_mut()
    } else {
        calls.iter_mut().find(|call| call.id == fragment.id)
    };

    match existing {
        Some(call) => {
            if call.name.is_empty() {
                call.name = fragment.name.clone();
            }
            call.arguments.push_str(&fragment.arguments);
        }
        None => calls.push(fragment.clone()),
    }
}
