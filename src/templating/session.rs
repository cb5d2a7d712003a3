//! The per-run parameter session consulted when rendering templates.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A parameter value after coercion.
///
/// Serializes untagged so the rendering context sees plain JSON values
/// (`42`, `true`, `"text"`) rather than enum wrappers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// Untyped or string-typed parameter
    String(String),
    /// Boolean
    Bool(bool),
    /// Single character
    Char(char),
    /// Any signed integer width
    Int(i64),
    /// Any unsigned integer width
    UInt(u64),
    /// Floating point
    Float(f64),
    /// Values produced by custom converters
    Json(serde_json::Value),
}

impl ParameterValue {
    /// The string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::String(s) => write!(f, "{s}"),
            ParameterValue::Bool(b) => write!(f, "{b}"),
            ParameterValue::Char(c) => write!(f, "{c}"),
            ParameterValue::Int(i) => write!(f, "{i}"),
            ParameterValue::UInt(u) => write!(f, "{u}"),
            ParameterValue::Float(x) => write!(f, "{x}"),
            ParameterValue::Json(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::String(value.to_string())
    }
}

/// Name-keyed parameter values shared by every template in a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    values: BTreeMap<String, ParameterValue>,
}

impl Session {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value.
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(name)
    }

    /// Whether a value is set.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Set a value, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: ParameterValue) {
        self.values.insert(name.into(), value);
    }

    /// Remove a value.
    pub fn remove(&mut self, name: &str) -> Option<ParameterValue> {
        self.values.remove(name)
    }

    /// Iterate in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParameterValue)> {
        self.values.iter()
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the session is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_serialize_untagged() {
        let values = vec![
            ParameterValue::Int(42),
            ParameterValue::Bool(true),
            ParameterValue::from("text"),
            ParameterValue::Char('x'),
        ];
        assert_eq!(serde_json::to_string(&values).unwrap(), r#"[42,true,"text","x"]"#);
    }

    #[test]
    fn test_session_insert_replaces() {
        let mut session = Session::new();
        session.insert("Count", ParameterValue::from("42"));
        session.insert("Count", ParameterValue::Int(42));

        assert_eq!(session.len(), 1);
        assert_eq!(session.get("Count"), Some(&ParameterValue::Int(42)));
        assert_eq!(session.remove("Count").map(|v| v.to_string()), Some("42".to_string()));
        assert!(session.is_empty());
    }
}
