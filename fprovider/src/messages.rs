//! Helpers for merging, filtering, and augmenting message sequences.
//!
//! ```rust
//! use fprovider::{Message, MessageKind, merge_adjacent_same_kind};
//!
//! let merged = merge_adjacent_same_kind(&[
//!     Message::user("a"),
//!     Message::user("b"),
//!     Message::assistant("c"),
//! ])
//! .expect("user runs merge");
//!
//! assert_eq!(merged.len(), 2);
//! assert_eq!(merged[0].kind(), MessageKind::User);
//! assert_eq!(merged[0].text(), "a\n\nb");
//! ```

use crate::{
    Message, MessageError, MessageKind, SystemMessage, ToolMessage, UserMessage,
};

pub const MERGE_SEPARATOR: &str = "\n\n";

/// Merges every message of `kind` into one message of that kind.
///
/// Texts are joined with a blank line, metadata is unioned with later keys winning, and
/// media or tool returns are concatenated in order. Assistant turns are independent and
/// cannot be merged.
pub fn merge_by_kind(messages: &[Message], kind: MessageKind) -> Result<Message, MessageError> {
    if kind == MessageKind::Assistant {
        return Err(MessageError::unsupported_kind(kind));
    }

    let matching = messages
        .iter()
        .filter(|message| message.kind() == kind)
        .collect::<Vec<_>>();

    if matching.is_empty() {
        return Err(MessageError::empty_input(format!(
            "no {kind} messages to merge"
        )));
    }

    let mut metadata = fcommon::MetadataMap::new();
    for message in &matching {
        metadata.extend(
            message
                .metadata()
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
    }

    let text = matching
        .iter()
        .map(|message| message.text())
        .collect::<Vec<_>>()
        .join(MERGE_SEPARATOR);

    let merged = match kind {
        MessageKind::System => Message::System(SystemMessage { text, metadata }),
        MessageKind::User => {
            let media = matching
                .iter()
                .filter_map(|message| message.as_user())
                .flat_map(|message| message.media.iter().cloned())
                .collect();

            Message::User(UserMessage {
                text,
                media,
                metadata,
            })
        }
        MessageKind::Tool => {
            let returns = matching
                .iter()
                .filter_map(|message| message.as_tool())
                .flat_map(|message| message.returns().iter().cloned())
                .collect();

            let mut tool = ToolMessage::new(returns)?;
            tool.metadata = metadata;
            Message::Tool(tool)
        }
        MessageKind::Assistant => unreachable!("assistant merge rejected above"),
    };

    Ok(merged)
}

/// Collapses maximal runs of same-kind messages.
///
/// Single messages pass through untouched. Assistant runs are also left as they are
/// because [`merge_by_kind`] refuses to merge assistant turns.
pub fn merge_adjacent_same_kind(messages: &[Message]) -> Result<Vec<Message>, MessageError> {
    let mut merged = Vec::with_capacity(messages.len());
    let mut start = 0;

    while start < messages.len() {
        let kind = messages[start].kind();
        let mut end = start + 1;
        while end < messages.len() && messages[end].kind() == kind {
            end += 1;
        }

        let run = &messages[start..end];
        if run.len() == 1 || kind == MessageKind::Assistant {
            merged.extend(run.iter().cloned());
        } else {
            merged.push(merge_by_kind(run, kind)?);
        }

        start = end;
    }

    Ok(merged)
}

pub fn filter_by_kinds<'a>(messages: &'a [Message], kinds: &[MessageKind]) -> Vec<&'a Message> {
    messages
        .iter()
        .filter(|message| kinds.contains(&message.kind()))
        .collect()
}

pub fn first_index_of(messages: &[Message], kind: MessageKind) -> Option<usize> {
    messages.iter().position(|message| message.kind() == kind)
}

pub fn last_index_of(messages: &[Message], kind: MessageKind) -> Option<usize> {
    messages.iter().rposition(|message| message.kind() == kind)
}

/// Checks the kind at `index`; negative indices count from the end (`-1` is the last).
pub fn has_kind_at(messages: &[Message], index: isize, kind: MessageKind) -> bool {
    let resolved = if index < 0 {
        messages.len().checked_sub(index.unsigned_abs())
    } else {
        Some(index as usize)
    };

    resolved
        .and_then(|position| messages.get(position))
        .is_some_and(|message| message.kind() == kind)
}

/// Replaces the text of the last message of `kind` with `transform(text)`.
///
/// Only user and system text may be augmented. A transform returning `None` leaves the
/// sequence untouched. Returns whether a message was rewritten.
pub fn augment_last_of_kind<F>(
    messages: &mut [Message],
    kind: MessageKind,
    transform: F,
) -> Result<bool, MessageError>
where
    F: FnOnce(&str) -> Option<String>,
{
    if !matches!(kind, MessageKind::User | MessageKind::System) {
        return Err(MessageError::unsupported_kind(kind));
    }

    let Some(index) = last_index_of(messages, kind) else {
        return Ok(false);
    };

    let Some(text) = transform(messages[index].text()) else {
        return Ok(false);
    };

    match &mut messages[index] {
        Message::User(message) => message.text = text,
        Message::System(message) => message.text = text,
        Message::Assistant(_) | Message::Tool(_) => unreachable!("kind checked above"),
    }

    Ok(true)
}
