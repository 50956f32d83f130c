//! Setting values and the environment map
//!
//! A setting is plain JSON data, an untagged function carried verbatim, or a
//! deferred producer that resolution replaces with its result.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::deferred::Deferred;
use crate::error::{Result, SettingsError};

/// Name of the environment holding shared defaults.
pub const COMMON_ENV: &str = "common";

/// Key that always carries the requested environment name.
pub const ENV_KEY: &str = "ENV";

/// Settings for one environment, keyed by setting name.
///
/// Keys keep their insertion order, which is also the order deferred
/// producers are invoked in.
pub type PartialConfig = IndexMap<String, Setting>;

/// An untagged function value.
///
/// Resolution never invokes it; it shows up in the resolved settings as the
/// same function.
#[derive(Clone)]
pub struct Callable(pub(crate) Arc<dyn Fn() -> Value + Send + Sync>);

impl Callable {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self) -> Value {
        (self.0)()
    }

    /// Tag this function as a deferred producer.
    pub fn mark_deferred(self) -> Deferred {
        Deferred::from_callable(self)
    }

    /// Whether both handles point at the same function.
    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({:p})", Arc::as_ptr(&self.0))
    }
}

/// A single configuration value.
#[derive(Clone, Debug)]
pub enum Setting {
    /// Plain data, including nested objects and arrays
    Value(Value),
    /// Function value carried verbatim
    Function(Callable),
    /// Producer invoked during resolution
    Deferred(Deferred),
}

impl Setting {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Setting::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Callable> {
        match self {
            Setting::Function(callable) => Some(callable),
            _ => None,
        }
    }

    pub fn as_deferred(&self) -> Option<&Deferred> {
        match self {
            Setting::Deferred(deferred) => Some(deferred),
            _ => None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Setting::Deferred(_))
    }

    /// Short description of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Setting::Value(_) => "value",
            Setting::Function(_) => "function",
            Setting::Deferred(_) => "deferred producer",
        }
    }
}

/// Functions and producers compare by identity, plain data by content.
impl PartialEq for Setting {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Setting::Value(a), Setting::Value(b)) => a == b,
            (Setting::Function(a), Setting::Function(b)) => a.ptr_eq(b),
            (Setting::Deferred(a), Setting::Deferred(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<Value> for Setting {
    fn from(value: Value) -> Self {
        Setting::Value(value)
    }
}

impl From<Callable> for Setting {
    fn from(callable: Callable) -> Self {
        Setting::Function(callable)
    }
}

impl From<Deferred> for Setting {
    fn from(deferred: Deferred) -> Self {
        Setting::Deferred(deferred)
    }
}

impl Serialize for Setting {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Setting::Value(value) => value.serialize(serializer),
            other => Err(serde::ser::Error::custom(format!(
                "a {} is not plain data",
                other.kind()
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Setting {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Setting::Value)
    }
}

/// Partial settings for every environment.
///
/// The `"common"` entry holds the defaults that every other environment is
/// layered over. A missing `"common"` entry counts as empty defaults.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ConfigMap {
    environments: BTreeMap<String, PartialConfig>,
}

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ConfigMap::insert`].
    pub fn with_environment(mut self, name: impl Into<String>, settings: PartialConfig) -> Self {
        self.insert(name, settings);
        self
    }

    /// Add or replace an environment, returning the previous entry.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        settings: PartialConfig,
    ) -> Option<PartialConfig> {
        self.environments.insert(name.into(), settings)
    }

    pub fn get(&self, name: &str) -> Option<&PartialConfig> {
        self.environments.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.environments.contains_key(name)
    }

    /// Shared defaults, if a `"common"` entry exists.
    pub fn common(&self) -> Option<&PartialConfig> {
        self.get(COMMON_ENV)
    }

    /// Environment names in sorted order.
    pub fn environments(&self) -> impl Iterator<Item = &str> {
        self.environments.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.environments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }

    /// Build a map from a JSON object of objects.
    ///
    /// Every value becomes plain data. Deferred producers and functions are
    /// added afterwards through [`ConfigMap::insert`] or by editing the
    /// partial configs before handing the map to a resolver.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(root) = value else {
            return Err(SettingsError::InvalidConfigMap(
                "root must be a JSON object".to_string(),
            ));
        };

        let mut map = ConfigMap::new();
        for (name, entry) in root {
            let Value::Object(fields) = entry else {
                return Err(SettingsError::InvalidConfigMap(format!(
                    "environment '{}' must be a JSON object",
                    name
                )));
            };
            let settings = fields
                .into_iter()
                .map(|(key, value)| (key, Setting::Value(value)))
                .collect();
            map.insert(name, settings);
        }
        Ok(map)
    }

    /// Parse a map from JSON text, with the same checks as [`ConfigMap::from_value`].
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }
}

impl FromIterator<(String, PartialConfig)> for ConfigMap {
    fn from_iter<I: IntoIterator<Item = (String, PartialConfig)>>(iter: I) -> Self {
        Self {
            environments: iter.into_iter().collect(),
        }
    }
}
