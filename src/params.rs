//! src/params.rs
//!
//! Per-channel parameter bag.

use serde_json::{Map, Value};

/// Key/value parameters attached to a channel.
///
/// Keys containing dots also resolve through nested objects, so
/// `"rotation.count"` finds `{"rotation": {"count": 3}}` when no literal
/// `"rotation.count"` key exists.
///
/// # Examples
///
/// ```
/// use logbook::ParamBag;
/// use serde_json::json;
///
/// let mut params = ParamBag::new();
/// params.set("rotate", json!(3));
/// params.set("format", json!(""));
///
/// assert_eq!(params.get_or("rotate", json!(10)), json!(3));
/// assert_eq!(params.get_or("level", json!("DEBUG")), json!("DEBUG"));
/// assert!(params.truthy("format").is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamBag {
    values: Map<String, Value>,
}

impl ParamBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.values.get(key) {
            return Some(value);
        }
        if !key.contains('.') {
            return None;
        }

        let mut segments = key.split('.');
        let first = segments.next()?;
        segments.try_fold(self.values.get(first)?, |value, segment| {
            value.as_object()?.get(segment)
        })
    }

    /// Returns the value stored under `key`, or `default` when absent.
    #[must_use]
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).cloned().unwrap_or(default)
    }

    /// Returns the value under `key` unless it is missing or empty.
    ///
    /// `null`, `false`, zero, the strings `""` and `"0"`, and empty arrays or
    /// objects all count as empty.
    #[must_use]
    pub fn truthy(&self, key: &str) -> Option<&Value> {
        self.get(key).filter(|value| is_truthy(value))
    }

    /// Returns the string under `key` unless it is missing or empty.
    #[must_use]
    pub fn non_empty_str(&self, key: &str) -> Option<&str> {
        self.truthy(key).and_then(Value::as_str)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Removes and returns the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Merges `params` into the bag; incoming keys win.
    pub fn merge(&mut self, params: Map<String, Value>) {
        self.values.extend(params);
    }

    /// Reports whether `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// All stored parameters.
    #[must_use]
    pub const fn all(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Number of top-level keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Reports whether the bag holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Map<String, Value>> for ParamBag {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n.abs() > 0.0),
        Value::String(text) => !text.is_empty() && text != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
