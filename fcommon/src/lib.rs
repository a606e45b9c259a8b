//! Shared utilities and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use fcommon::{ConversationId, MetadataMap, ParamBag, ParamKey};
//!
//! const TENANT: ParamKey<String> = ParamKey::new("app.tenant");
//!
//! let conversation = ConversationId::from("conversation-1");
//! let mut metadata = MetadataMap::new();
//! metadata.insert("tenant".to_string(), "acme".into());
//!
//! let params = ParamBag::new();
//! params.set_as(&TENANT, "acme".to_string()).expect("string should encode");
//!
//! assert_eq!(conversation.as_str(), "conversation-1");
//! assert_eq!(params.get_as(&TENANT).unwrap().as_deref(), Some("acme"));
//! ```

mod cancel;
mod params;

pub mod future {
    //! Shared async future and stream aliases.
    //!
    //! ```rust
    //! use fcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    use futures_core::Stream;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

    pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;
}

pub mod context {
    //! Shared metadata and cross-crate identifier newtypes.
    //!
    //! ```rust
    //! use fcommon::{ConversationId, MetadataMap};
    //!
    //! let conversation = ConversationId::new("conversation-42");
    //! let mut metadata = MetadataMap::new();
    //! metadata.insert("env".to_string(), "test".into());
    //!
    //! assert_eq!(conversation.to_string(), "conversation-42");
    //! ```

    use std::collections::HashMap;
    use std::fmt::{Display, Formatter};

    use serde_json::Value;

    pub type MetadataMap = HashMap<String, Value>;

    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct ConversationId(String);

    impl ConversationId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for ConversationId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for ConversationId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for ConversationId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }

    impl AsRef<str> for ConversationId {
        fn as_ref(&self) -> &str {
            &self.0
        }
    }
}

pub mod registry {
    //! Generic registry map wrapper used by runtime registries.
    //!
    //! ```rust
    //! use fcommon::Registry;
    //!
    //! let mut registry = Registry::new();
    //! registry.insert("alpha".to_string(), 1_u32);
    //!
    //! assert_eq!(registry.get("alpha"), Some(&1));
    //! assert!(registry.contains_key("alpha"));
    //! ```

    use std::borrow::Borrow;
    use std::collections::HashMap;
    use std::hash::Hash;

    #[derive(Debug, Clone)]
    pub struct Registry<K, V> {
        items: HashMap<K, V>,
    }

    impl<K, V> Default for Registry<K, V>
    where
        K: Eq + Hash,
    {
        fn default() -> Self {
            Self {
                items: HashMap::new(),
            }
        }
    }

    impl<K, V> Registry<K, V>
    where
        K: Eq + Hash,
    {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, key: K, value: V) -> Option<V> {
            self.items.insert(key, value)
        }

        /// Inserts only when the key is absent. Returns `false` when an entry already existed.
        pub fn insert_if_absent(&mut self, key: K, value: V) -> bool {
            if self.items.contains_key(&key) {
                return false;
            }

            self.items.insert(key, value);
            true
        }

        pub fn get<Q>(&self, key: &Q) -> Option<&V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.get(key)
        }

        pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.remove(key)
        }

        pub fn contains_key<Q>(&self, key: &Q) -> bool
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.contains_key(key)
        }

        pub fn keys(&self) -> impl Iterator<Item = &K> {
            self.items.keys()
        }

        pub fn values(&self) -> impl Iterator<Item = &V> {
            self.items.values()
        }

        pub fn clear(&mut self) {
            self.items.clear();
        }

        pub fn len(&self) -> usize {
            self.items.len()
        }

        pub fn is_empty(&self) -> bool {
            self.items.is_empty()
        }
    }
}

pub use cancel::{CallContext, ContextError, ContextErrorKind};
pub use context::{ConversationId, MetadataMap};
pub use future::{BoxFuture, BoxStream};
pub use params::{ParamBag, ParamError, ParamKey};
pub use registry::Registry;
