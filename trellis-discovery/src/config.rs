//! Discovered component configuration
//!
//! A `ComponentConfig` is the declarative configuration loaded for a
//! discovery entry: a flat-or-nested JSON mapping with two keys the pipeline
//! itself cares about, `name` and `enabled`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Configuration mapping for a discovered component
///
/// # Examples
///
/// ```rust
/// use trellis_discovery::ComponentConfig;
/// use serde_json::json;
///
/// let config = ComponentConfig::from_value(json!({
///     "name": "metrics",
///     "enabled": true,
///     "flushIntervalMs": 5000,
/// }))
/// .expect("object value");
///
/// assert_eq!(config.name(), Some("metrics"));
/// assert!(config.enabled());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentConfig {
    values: Map<String, Value>,
}

impl ComponentConfig {
    /// Creates an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing JSON mapping
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Wraps a JSON value, which must be an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(values) => Some(Self { values }),
            _ => None,
        }
    }

    /// Returns the value stored under `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Sets the value stored under `key`
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// The component name, when present and a string
    pub fn name(&self) -> Option<&str> {
        self.values.get("name").and_then(Value::as_str)
    }

    /// Whether the component is enabled
    ///
    /// Follows truthiness: absent, `null`, `false`, `0`, and the empty
    /// string all disable the component; everything else enables it.
    pub fn enabled(&self) -> bool {
        match self.values.get("enabled") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(enabled)) => *enabled,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        }
    }

    /// The underlying mapping
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl From<Map<String, Value>> for ComponentConfig {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}
