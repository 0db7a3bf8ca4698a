// ABOUTME: Host settings store with dotted key-path lookup
// ABOUTME: Backs theme, locale and filesystem settings consumed by the template functions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Locale used when the settings declare none.
pub const FALLBACK_LOCALE: &str = "en";

/// Nested host settings addressed by dotted paths such as `theming.theme`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: JsonValue,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            values: JsonValue::Object(Map::new()),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from a YAML document
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        let values: JsonValue = serde_yaml::from_str(contents)?;
        Ok(Self { values })
    }

    /// Look up a value by dotted key path
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        key.split('.')
            .try_fold(&self.values, |node, segment| node.get(segment))
    }

    /// Look up a value as a string, rendering scalars and falling back to `default`
    pub fn get_string(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Number(n)) => n.to_string(),
            Some(JsonValue::Bool(b)) => b.to_string(),
            _ => default.to_string(),
        }
    }

    /// Set a value by dotted key path, creating intermediate objects
    pub fn set(&mut self, key: &str, value: impl Into<JsonValue>) {
        let segments: Vec<&str> = key.split('.').collect();
        set_path(&mut self.values, &segments, value.into());
    }

    /// Builder-style variant of [`Settings::set`]
    pub fn with(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.set(key, value);
        self
    }

    /// First locale declared under `system.locales`
    pub fn default_locale(&self) -> String {
        self.get("system.locales")
            .and_then(JsonValue::as_object)
            .and_then(|locales| locales.keys().next().cloned())
            .unwrap_or_else(|| FALLBACK_LOCALE.to_string())
    }

    /// The active locale, defaulting to the first declared one
    pub fn locale(&self) -> String {
        self.get_string("locale", &self.default_locale())
    }

    /// Site URL configured for `locale`, falling back to the default locale's URL
    pub fn site_url(&self, locale: Option<&str>) -> String {
        let locale = locale
            .map(str::to_string)
            .unwrap_or_else(|| self.default_locale());

        self.get(&format!("system.locales.{}.url", locale))
            .or_else(|| self.get(&format!("system.locales.{}.url", self.default_locale())))
            .and_then(JsonValue::as_str)
            .unwrap_or("/")
            .to_string()
    }

    pub fn as_json(&self) -> &JsonValue {
        &self.values
    }
}

fn set_path(node: &mut JsonValue, segments: &[&str], value: JsonValue) {
    match segments.split_first() {
        None => *node = value,
        Some((head, rest)) => {
            if !node.is_object() {
                *node = JsonValue::Object(Map::new());
            }
            if let JsonValue::Object(obj) = node {
                let child = obj.entry(head.to_string()).or_insert(JsonValue::Null);
                set_path(child, rest, value);
            }
        }
    }
}
