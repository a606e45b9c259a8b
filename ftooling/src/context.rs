//! Per-invocation tool context.
//!
//! ```rust
//! use fcommon::CallContext;
//! use fprovider::Message;
//! use ftooling::ToolContext;
//!
//! let context = ToolContext::new(CallContext::new());
//! context.set("tenant", "acme");
//! context.history().add(Message::user("lookup acme"));
//!
//! let forked = context.clone();
//! forked.set("tenant", "globex");
//!
//! assert_eq!(context.get("tenant"), Some("acme".into()));
//! assert_eq!(forked.history().size(), 1);
//! ```

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use fcommon::{CallContext, MetadataMap};
use fprovider::Message;
use serde_json::Value;

/// Messages appended while a tool runs.
#[derive(Debug, Default)]
pub struct ToolHistory {
    messages: RwLock<Vec<Message>>,
}

impl ToolHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, message: Message) {
        self.write().push(message);
    }

    pub fn first(&self) -> Option<Message> {
        self.read().first().cloned()
    }

    pub fn last(&self) -> Option<Message> {
        self.read().last().cloned()
    }

    pub fn all(&self) -> Vec<Message> {
        self.read().clone()
    }

    /// Iterates over a snapshot taken at call time.
    pub fn iter(&self) -> impl Iterator<Item = Message> {
        self.all().into_iter()
    }

    pub fn size(&self) -> usize {
        self.read().len()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Message>> {
        self.messages.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Message>> {
        self.messages.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clone for ToolHistory {
    fn clone(&self) -> Self {
        Self {
            messages: RwLock::new(self.all()),
        }
    }
}

/// Mutable state handed to one tool invocation.
///
/// Fields are seeded from the request's tool parameters. Cloning deep-copies fields and
/// history; the call context is shared so cancellation still reaches the clone.
#[derive(Debug, Default)]
pub struct ToolContext {
    ctx: CallContext,
    fields: RwLock<MetadataMap>,
    history: ToolHistory,
}

impl ToolContext {
    pub fn new(ctx: CallContext) -> Self {
        Self {
            ctx,
            fields: RwLock::new(MetadataMap::new()),
            history: ToolHistory::new(),
        }
    }

    pub fn with_fields(self, fields: MetadataMap) -> Self {
        *self.fields.write().unwrap_or_else(PoisonError::into_inner) = fields;
        self
    }

    pub fn context(&self) -> &CallContext {
        &self.ctx
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn fields(&self) -> MetadataMap {
        self.fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.fields
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn history(&self) -> &ToolHistory {
        &self.history
    }
}

impl Clone for ToolContext {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            fields: RwLock::new(self.fields()),
            history: self.history.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_accessors_track_order() {
        let history = ToolHistory::new();
        assert!(history.first().is_none());

        history.add(Message::user("one"));
        history.add(Message::assistant("two"));

        assert_eq!(history.size(), 2);
        assert_eq!(history.first().map(|m| m.text().to_string()), Some("one".into()));
        assert_eq!(history.last().map(|m| m.text().to_string()), Some("two".into()));
        assert_eq!(history.iter().count(), 2);

        history.clear();
        assert_eq!(history.size(), 0);
    }

    #[test]
    fn clone_copies_fields_and_history() {
        let mut seed = MetadataMap::new();
        seed.insert("tenant".into(), "acme".into());
        let context = ToolContext::new(CallContext::new()).with_fields(seed);
        context.history().add(Message::user("hi"));

        let forked = context.clone();
        forked.clear();
        forked.history().add(Message::user("again"));

        assert_eq!(context.get("tenant"), Some("acme".into()));
        assert_eq!(context.history().size(), 1);
        assert!(forked.fields().is_empty());
        assert_eq!(forked.history().size(), 2);
    }

    #[test]
    fn clone_shares_cancellation() {
        let context = ToolContext::new(CallContext::new());
        let forked = context.clone();

        context.context().cancel();
        assert!(forked.context().is_cancelled());
    }
}
