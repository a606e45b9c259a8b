/// Creates a single [`Message`](crate::Message) from a kind shorthand.
///
/// ```rust
/// use fconverse::{MessageKind, ToolCall, fc_msg};
///
/// let message = fc_msg!(assistant => "Done.");
/// assert_eq!(message.kind(), MessageKind::Assistant);
/// assert_eq!(message.text(), "Done.");
///
/// let calling = fc_msg!(assistant => "", tool_calls => vec![ToolCall::new("c1", "calc", "{}")]);
/// assert!(calling.as_assistant().is_some_and(|assistant| assistant.has_tool_calls()));
/// ```
#[macro_export]
macro_rules! fc_msg {
    (system => $text:expr $(,)?) => {
        $crate::Message::system($text)
    };
    (user => $text:expr $(,)?) => {
        $crate::Message::user($text)
    };
    (assistant => $text:expr, tool_calls => $calls:expr $(,)?) => {
        $crate::Message::Assistant(
            $crate::fprovider::AssistantMessage::new($text).with_tool_calls($calls),
        )
    };
    (assistant => $text:expr $(,)?) => {
        $crate::Message::assistant($text)
    };
    ($kind:ident => $($rest:tt)*) => {
        compile_error!(
            "unsupported message kind: use system, user, or assistant (tool messages are built with Message::tool)"
        );
    };
}

/// Creates a `Vec<Message>` from kind/text pairs.
///
/// ```rust
/// use fconverse::{MessageKind, fc_messages};
///
/// let messages = fc_messages![
///     system => "You are concise.",
///     user => "Summarize this repository.",
/// ];
///
/// assert_eq!(messages.len(), 2);
/// assert_eq!(messages[0].kind(), MessageKind::System);
/// assert_eq!(messages[1].kind(), MessageKind::User);
/// ```
#[macro_export]
macro_rules! fc_messages {
    () => {
        Vec::<$crate::Message>::new()
    };
    ($($kind:ident => $text:expr),+ $(,)?) => {
        vec![$($crate::fc_msg!($kind => $text)),+]
    };
}
