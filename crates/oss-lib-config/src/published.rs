//! Read-only handle to a validated configuration and the process-wide slot
//! it is published into.
//!
//! Publishing is a single atomic pointer swap: readers observe either the
//! previous mapping or the new one, never a partial merge. Setup is expected
//! to run once, early, from a single thread; components that prefer explicit
//! wiring can keep the [`Config`] returned by setup instead of reading the
//! global slot.

use crate::{ConfigError, ConfigMapping};
use arc_swap::ArcSwapOption;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::ops::Index;
use std::sync::Arc;

static PUBLISHED: ArcSwapOption<ConfigMapping> = ArcSwapOption::const_empty();

/// Immutable, cheaply clonable view over a configuration mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    inner: Arc<ConfigMapping>,
}

impl Config {
    pub fn new(mapping: ConfigMapping) -> Self {
        Self {
            inner: Arc::new(mapping),
        }
    }

    /// The most recently published configuration, if setup has completed.
    pub fn current() -> Option<Self> {
        PUBLISHED.load_full().map(|inner| Self { inner })
    }

    /// Make this configuration the process-wide one, replacing any previous.
    pub fn publish(&self) {
        PUBLISHED.store(Some(Arc::clone(&self.inner)));
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    /// Look up a key that must be present.
    pub fn try_get(&self, key: &str) -> Result<&Value, ConfigError> {
        self.inner
            .get(key)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.inner.get(key).unwrap_or(default)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.inner.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.inner.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn as_map(&self) -> &ConfigMapping {
        &self.inner
    }

    /// Decode the whole configuration into a typed struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        Ok(serde_json::from_value(Value::Object(
            self.inner.as_ref().clone(),
        ))?)
    }
}

impl Index<&str> for Config {
    type Output = Value;

    /// Panics when the key is absent; use [`Config::try_get`] to handle that.
    fn index(&self, key: &str) -> &Value {
        match self.inner.get(key) {
            Some(value) => value,
            None => panic!("missing config key: {key}"),
        }
    }
}

impl<'a> IntoIterator for &'a Config {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl From<ConfigMapping> for Config {
    fn from(mapping: ConfigMapping) -> Self {
        Self::new(mapping)
    }
}

/// The most recently published configuration, if any.
pub fn published() -> Option<Config> {
    Config::current()
}
