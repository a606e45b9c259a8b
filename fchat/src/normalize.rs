//! Message-list normalization applied before a request enters the middleware chain.
//!
//! ```rust
//! use fcommon::MetadataMap;
//! use fchat::normalize_messages;
//! use fprovider::{Message, MessageKind};
//!
//! let normalized = normalize_messages(
//!     &[Message::user("a"), Message::system("s"), Message::user("b")],
//!     None,
//!     None,
//!     &MetadataMap::new(),
//! )
//! .expect("valid messages");
//!
//! assert_eq!(normalized[0].kind(), MessageKind::System);
//! assert_eq!(normalized.len(), 3);
//! ```

use fcommon::MetadataMap;
use fprompt::{SystemPromptTemplate, UserPromptTemplate};
use fprovider::{Message, MessageKind, merge_adjacent_same_kind, merge_by_kind};

use crate::{ChatError, TemplateSource};

/// User text sent when a prompt carries neither messages nor a user template.
pub const DEFAULT_GREETING: &str = "Hello";

/// Produces the provider-ready message list.
///
/// 1. An empty list is seeded from the user template, or with [`DEFAULT_GREETING`].
/// 2. Adjacent runs of the same kind are merged (assistant runs are kept apart).
/// 3. Every system message is folded into one system message at index 0. Without one, the
///    system template is rendered into that slot when configured.
///
/// Non-system messages keep their relative order.
pub fn normalize_messages(
    messages: &[Message],
    user_template: Option<&UserPromptTemplate>,
    system_template: Option<&SystemPromptTemplate>,
    vars: &MetadataMap,
) -> Result<Vec<Message>, ChatError> {
    let seeded;
    let messages = if messages.is_empty() {
        let seed = match user_template {
            Some(template) => template
                .render(vars)
                .map_err(|err| ChatError::template_render_failed(TemplateSource::User, err))?,
            None => Message::user(DEFAULT_GREETING),
        };
        seeded = vec![seed];
        seeded.as_slice()
    } else {
        messages
    };

    let merged = merge_adjacent_same_kind(messages)?;
    let (systems, rest): (Vec<Message>, Vec<Message>) = merged
        .into_iter()
        .partition(|message| message.kind() == MessageKind::System);

    let system = if systems.is_empty() {
        system_template
            .map(|template| {
                template
                    .render(vars)
                    .map_err(|err| ChatError::template_render_failed(TemplateSource::System, err))
            })
            .transpose()?
    } else {
        Some(merge_by_kind(&systems, MessageKind::System)?)
    };

    let mut normalized = Vec::with_capacity(rest.len() + 1);
    normalized.extend(system);
    normalized.extend(rest);

    if normalized.is_empty() {
        return Err(ChatError::empty_messages());
    }

    Ok(normalized)
}
