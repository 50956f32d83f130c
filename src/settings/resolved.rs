//! Resolved settings for one environment
//!
//! Holds the merged settings with every deferred producer replaced, plus the
//! `ENV` key naming the environment they were resolved for.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::value::{PartialConfig, Setting, ENV_KEY};
use crate::error::{Result, SettingsError};

/// Fully merged settings for one environment
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedConfig {
    env: String,
    settings: PartialConfig,
}

impl ResolvedConfig {
    pub(crate) fn new(env: String, settings: PartialConfig) -> Self {
        Self { env, settings }
    }

    /// Environment these settings were resolved for.
    pub fn env(&self) -> &str {
        &self.env
    }

    pub fn get(&self, key: &str) -> Option<&Setting> {
        self.settings.get(key)
    }

    /// Plain data stored under a top-level key.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.get(key).and_then(Setting::as_value)
    }

    /// Get plain data by path (dot-separated).
    ///
    /// The first segment names a top-level setting; the rest walk into
    /// nested objects.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.value(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get_path(path).and_then(|v| v.as_str())
    }

    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get_path(path).and_then(|v| v.as_u64())
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get_path(path).and_then(|v| v.as_bool())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.settings.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.settings.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Setting)> {
        self.settings.iter().map(|(key, setting)| (key.as_str(), setting))
    }

    /// Number of keys, `ENV` included.
    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    pub fn into_settings(self) -> PartialConfig {
        self.settings
    }

    /// Convert to a JSON object.
    ///
    /// Fails if any setting is a function or a producer that was never
    /// resolved.
    pub fn to_value(&self) -> Result<Value> {
        let mut map = Map::new();
        for (key, setting) in &self.settings {
            match setting {
                Setting::Value(value) => {
                    map.insert(key.clone(), value.clone());
                }
                other => {
                    return Err(SettingsError::NotPlainData {
                        key: key.clone(),
                        kind: other.kind(),
                    })
                }
            }
        }
        Ok(Value::Object(map))
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        let value = self.to_value()?;
        Ok(serde_json::to_string_pretty(&value)?)
    }
}

impl Serialize for ResolvedConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.settings.len()))?;
        for (key, setting) in &self.settings {
            map.serialize_entry(key, setting)?;
        }
        map.end()
    }
}

impl std::ops::Index<&str> for ResolvedConfig {
    type Output = Setting;

    fn index(&self, key: &str) -> &Setting {
        &self.settings[key]
    }
}

/// Stamp the environment name onto a merged map.
pub(crate) fn tag_environment(settings: &mut PartialConfig, env: &str) {
    settings.insert(ENV_KEY.to_string(), Setting::Value(Value::String(env.to_string())));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::value::Callable;
    use serde_json::json;

    fn resolved(value: Value) -> ResolvedConfig {
        let mut settings: PartialConfig = serde_json::from_value(value).unwrap();
        tag_environment(&mut settings, "test");
        ResolvedConfig::new("test".to_string(), settings)
    }

    #[test]
    fn test_getters() {
        let config = resolved(json!({
            "port": 8080,
            "debug": true,
            "db": {"host": "localhost", "pool": {"size": 4}}
        }));

        assert_eq!(config.env(), "test");
        assert_eq!(config.get_str("ENV"), Some("test"));
        assert_eq!(config.get_u64("port"), Some(8080));
        assert_eq!(config.get_bool("debug"), Some(true));
        assert_eq!(config.get_str("db.host"), Some("localhost"));
        assert_eq!(config.get_u64("db.pool.size"), Some(4));
        assert_eq!(config.get_path("db.missing"), None);
        assert_eq!(config.get_path("missing"), None);
        assert_eq!(config.len(), 4);
    }

    #[test]
    fn test_to_value() {
        let config = resolved(json!({"hello": "world"}));
        assert_eq!(
            config.to_value().unwrap(),
            json!({"ENV": "test", "hello": "world"})
        );
        assert!(config.to_json().unwrap().contains("\"hello\": \"world\""));
    }

    #[test]
    fn test_to_json_keeps_key_order() {
        let mut settings: PartialConfig =
            serde_json::from_value(json!({"zeta": 1, "alpha": 2})).unwrap();
        tag_environment(&mut settings, "test");
        let config = ResolvedConfig::new("test".to_string(), settings);

        let json = config.to_json().unwrap();
        let zeta = json.find("zeta").unwrap();
        let alpha = json.find("alpha").unwrap();
        let env = json.find("ENV").unwrap();
        assert!(zeta < alpha && alpha < env);
        assert_eq!(config.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "ENV"]);
    }

    #[test]
    fn test_to_json_rejects_function() {
        let mut settings = PartialConfig::new();
        settings.insert("f".to_string(), Setting::Function(Callable::new(|| json!(1))));
        let config = ResolvedConfig::new("test".to_string(), settings);

        assert!(matches!(
            config.to_json().unwrap_err(),
            SettingsError::NotPlainData { .. }
        ));
    }

    #[test]
    fn test_to_value_rejects_function() {
        let mut settings = PartialConfig::new();
        settings.insert("f".to_string(), Setting::Function(Callable::new(|| json!(1))));
        let config = ResolvedConfig::new("test".to_string(), settings);

        let err = config.to_value().unwrap_err();
        assert!(matches!(
            err,
            SettingsError::NotPlainData { ref key, kind: "function" } if key == "f"
        ));
        assert!(serde_json::to_string(&config).is_err());
    }

    #[test]
    fn test_env_tag_overwrites() {
        let mut settings: PartialConfig =
            serde_json::from_value(json!({"ENV": "stale"})).unwrap();
        tag_environment(&mut settings, "fresh");
        assert_eq!(settings[ENV_KEY], Setting::Value(json!("fresh")));
    }
}
