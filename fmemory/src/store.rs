//! Conversation store contract and the in-memory reference store.
//!
//! ```rust
//! use fcommon::{CallContext, ConversationId};
//! use fmemory::{ConversationMemory, InMemoryConversationMemory};
//! use fprovider::Message;
//!
//! # tokio_test_block_on(async {
//! let store = InMemoryConversationMemory::new();
//! let ctx = CallContext::new();
//! let id = ConversationId::from("c-1");
//!
//! store.write(&ctx, &id, vec![Message::user("hi")]).await.expect("write");
//! let history = store.read(&ctx, &id).await.expect("read");
//! assert_eq!(history, vec![Message::user("hi")]);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(future: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(future)
//! # }
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use fcommon::{BoxFuture, CallContext, ConversationId};
use fprovider::Message;

use crate::MemoryError;

/// Append-only message history keyed by conversation.
pub trait ConversationMemory: Send + Sync {
    /// Returns the stored messages in write order, or an empty list for unknown ids.
    fn read<'a>(
        &'a self,
        ctx: &'a CallContext,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<Vec<Message>, MemoryError>>;

    fn write<'a>(
        &'a self,
        ctx: &'a CallContext,
        conversation_id: &'a ConversationId,
        messages: Vec<Message>,
    ) -> BoxFuture<'a, Result<(), MemoryError>>;

    fn clear<'a>(
        &'a self,
        ctx: &'a CallContext,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<(), MemoryError>>;
}

#[derive(Debug, Default)]
pub struct InMemoryConversationMemory {
    conversations: RwLock<HashMap<ConversationId, Vec<Message>>>,
}

impl InMemoryConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversation_ids(&self) -> Result<Vec<ConversationId>, MemoryError> {
        let conversations = self
            .conversations
            .read()
            .map_err(|_| MemoryError::storage("conversation store lock poisoned"))?;

        let mut ids = conversations.keys().cloned().collect::<Vec<_>>();
        ids.sort();
        Ok(ids)
    }
}

impl ConversationMemory for InMemoryConversationMemory {
    fn read<'a>(
        &'a self,
        ctx: &'a CallContext,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<Vec<Message>, MemoryError>> {
        Box::pin(async move {
            ctx.check()?;
            let conversations = self
                .conversations
                .read()
                .map_err(|_| MemoryError::storage("conversation store lock poisoned"))?;

            Ok(conversations
                .get(conversation_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn write<'a>(
        &'a self,
        ctx: &'a CallContext,
        conversation_id: &'a ConversationId,
        messages: Vec<Message>,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            ctx.check()?;
            let mut conversations = self
                .conversations
                .write()
                .map_err(|_| MemoryError::storage("conversation store lock poisoned"))?;

            conversations
                .entry(conversation_id.clone())
                .or_default()
                .extend(messages);
            Ok(())
        })
    }

    fn clear<'a>(
        &'a self,
        ctx: &'a CallContext,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            ctx.check()?;
            let mut conversations = self
                .conversations
                .write()
                .map_err(|_| MemoryError::storage("conversation store lock poisoned"))?;

            conversations.remove(conversation_id);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryErrorKind;

    #[tokio::test]
    async fn writes_append_in_order_per_conversation() {
        let store = InMemoryConversationMemory::new();
        let ctx = CallContext::new();
        let first = ConversationId::from("b");
        let second = ConversationId::from("a");

        store
            .write(&ctx, &first, vec![Message::user("1")])
            .await
            .expect("write");
        store
            .write(
                &ctx,
                &first,
                vec![Message::assistant("2"), Message::user("3")],
            )
            .await
            .expect("write");
        store
            .write(&ctx, &second, vec![Message::user("other")])
            .await
            .expect("write");

        let history = store.read(&ctx, &first).await.expect("read");
        let texts = history.iter().map(Message::text).collect::<Vec<_>>();
        assert_eq!(texts, vec!["1", "2", "3"]);
        assert_eq!(
            store.conversation_ids().expect("ids"),
            vec![second.clone(), first.clone()]
        );

        store.clear(&ctx, &first).await.expect("clear");
        assert!(store.read(&ctx, &first).await.expect("read").is_empty());
    }

    #[tokio::test]
    async fn cancelled_context_aborts_store_operations() {
        let store = InMemoryConversationMemory::new();
        let ctx = CallContext::new();
        ctx.cancel();

        let error = store
            .write(&ctx, &ConversationId::from("c"), vec![Message::user("x")])
            .await
            .expect_err("cancelled");
        assert_eq!(error.kind, MemoryErrorKind::Other);
        assert!(error.context.is_some());
        assert!(store.conversation_ids().expect("ids").is_empty());
    }
}
