//! Reserved per-call parameters shared between the client and its middlewares.
//!
//! The keys themselves are private. Reads and writes go through the typed accessors below,
//! which report malformed values as [`ChatError`]s.
//!
//! ```rust
//! use fcommon::ParamBag;
//! use fchat::{conversation_id, set_conversation_id};
//!
//! let params = ParamBag::new();
//! assert_eq!(conversation_id(&params).unwrap(), None);
//!
//! set_conversation_id(&params, "c-1");
//! assert_eq!(conversation_id(&params).unwrap().unwrap().as_str(), "c-1");
//! ```

use fcommon::{ConversationId, ParamBag, ParamKey};

use crate::ChatError;

const OUTPUT_FORMAT: ParamKey<String> = ParamKey::new("fchat.output_format");
const CONVERSATION_ID: ParamKey<String> = ParamKey::new("fchat.conversation_id");
const TOOL_ROUND: ParamKey<u32> = ParamKey::new("fchat.tool_round");

/// Format instructions appended to the last user message before the provider call.
pub fn output_format(params: &ParamBag) -> Option<String> {
    params.get_as(&OUTPUT_FORMAT).ok().flatten()
}

pub fn set_output_format(params: &ParamBag, instructions: impl Into<String>) {
    params.set(OUTPUT_FORMAT.name(), instructions.into());
}

pub fn conversation_id(params: &ParamBag) -> Result<Option<ConversationId>, ChatError> {
    match params.get_as(&CONVERSATION_ID) {
        Ok(Some(value)) if value.trim().is_empty() => Err(ChatError::invalid_conversation_id(
            "conversation id must not be empty",
        )),
        Ok(value) => Ok(value.map(ConversationId::from)),
        Err(err) => Err(ChatError::invalid_conversation_id(err.to_string())),
    }
}

pub fn set_conversation_id(params: &ParamBag, id: impl Into<ConversationId>) {
    params.set(CONVERSATION_ID.name(), id.into().as_str());
}

/// Number of tool round trips already taken in this turn. Zero for the first model call.
pub fn tool_round(params: &ParamBag) -> u32 {
    params.get_as(&TOOL_ROUND).ok().flatten().unwrap_or(0)
}

pub(crate) fn set_tool_round(params: &ParamBag, round: u32) {
    params.set(TOOL_ROUND.name(), round);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChatErrorKind;

    #[test]
    fn non_string_conversation_id_is_rejected() {
        let params = ParamBag::new();
        params.set("fchat.conversation_id", 7);

        let error = conversation_id(&params).expect_err("number is not an id");
        assert_eq!(error.kind, ChatErrorKind::InvalidConversationId);

        params.set("fchat.conversation_id", "  ");
        assert!(conversation_id(&params).is_err());
    }

    #[test]
    fn tool_round_defaults_to_zero() {
        let params = ParamBag::new();
        assert_eq!(tool_round(&params), 0);

        set_tool_round(&params, 3);
        assert_eq!(tool_round(&params), 3);
    }
}
