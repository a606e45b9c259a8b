//! Concurrent parameter scratchpad shared by requests, responses, and tool contexts.
//!
//! ```rust
//! use fcommon::{ParamBag, ParamKey};
//!
//! const ATTEMPT: ParamKey<u32> = ParamKey::new("app.attempt");
//!
//! let params = ParamBag::new();
//! params.set("locale", "en-GB");
//! params.set_as(&ATTEMPT, 2).expect("u32 should encode");
//!
//! let forked = params.clone();
//! forked.set("locale", "fr-FR");
//!
//! assert_eq!(params.get("locale"), Some("en-GB".into()));
//! assert_eq!(params.get_as(&ATTEMPT).expect("u32 should decode"), Some(2));
//! ```

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::marker::PhantomData;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Typed handle for a well-known parameter name.
///
/// The phantom type fixes how the stored JSON value is decoded, so reserved keys can stay
/// module-private while the bag itself remains a dynamic map at the public surface.
pub struct ParamKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ParamKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ParamKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ParamKey<T> {}

impl<T> Debug for ParamKey<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ParamKey").field(&self.name).finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamError {
    pub key: String,
    pub message: String,
}

impl Display for ParamError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "parameter '{}' has an unexpected shape: {}", self.key, self.message)
    }
}

impl Error for ParamError {}

/// String-keyed map of JSON values guarded by a reader/writer lock.
///
/// Cloning produces an independent deep copy.
#[derive(Debug, Default)]
pub struct ParamBag {
    entries: RwLock<HashMap<String, Value>>,
}

impl ParamBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(entries: HashMap<String, Value>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.read().get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.write().insert(key.into(), value.into())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.write().remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    pub fn get_as<T>(&self, key: &ParamKey<T>) -> Result<Option<T>, ParamError>
    where
        T: DeserializeOwned,
    {
        match self.get(key.name()) {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|err| ParamError {
                    key: key.name().to_string(),
                    message: err.to_string(),
                }),
            None => Ok(None),
        }
    }

    pub fn set_as<T>(&self, key: &ParamKey<T>, value: T) -> Result<(), ParamError>
    where
        T: Serialize,
    {
        let encoded = serde_json::to_value(value).map_err(|err| ParamError {
            key: key.name().to_string(),
            message: err.to_string(),
        })?;

        self.set(key.name(), encoded);
        Ok(())
    }

    pub fn extend(&self, entries: impl IntoIterator<Item = (String, Value)>) {
        self.write().extend(entries);
    }

    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.read().clone()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Value>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Value>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clone for ParamBag {
    fn clone(&self) -> Self {
        Self::from_map(self.snapshot())
    }
}

impl PartialEq for ParamBag {
    fn eq(&self, other: &Self) -> bool {
        self.snapshot() == other.snapshot()
    }
}

impl From<HashMap<String, Value>> for ParamBag {
    fn from(value: HashMap<String, Value>) -> Self {
        Self::from_map(value)
    }
}
