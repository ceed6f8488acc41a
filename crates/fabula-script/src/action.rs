//! Action payloads and the per-fragment action map.

use std::fmt;

use fabula_core::Value;
use indexmap::IndexMap;

/// Map keys that carry condition clauses rather than actions.
///
/// `if`/`ifOr` gate visibility, `active`/`activeOr` gate availability.
/// They are skipped when an action map is executed.
pub const CLAUSE_KEYS: [&str; 4] = ["if", "ifOr", "active", "activeOr"];

/// True for the reserved clause keys.
pub fn is_clause_key(key: &str) -> bool {
    CLAUSE_KEYS.contains(&key)
}

/// The argument of one action invocation.
///
/// The shape is decided once, when the enclosing action map is parsed.
/// A `Sequence` payload means the action is invoked once per element.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A single scalar value.
    Scalar(Value),
    /// A keyed map of named sub-payloads, in authored order.
    Keyed(IndexMap<String, Payload>),
    /// An ordered list; repeated invocation.
    Sequence(Vec<Payload>),
}

/// Action name to payload, in authored order. Parsed fresh per fragment
/// and never persisted; a later duplicate key overwrites the earlier one.
pub type ActionMap = IndexMap<String, Payload>;

impl Payload {
    /// Convert a parsed JSON value. JSON `null` becomes the empty string.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Scalar(Value::Str(String::new())),
            serde_json::Value::Bool(b) => Self::Scalar(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                Self::Scalar(Value::Number(n.as_f64().unwrap_or(0.0)))
            }
            serde_json::Value::String(s) => Self::Scalar(Value::Str(s.clone())),
            serde_json::Value::Array(items) => {
                Self::Sequence(items.iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(fields) => Self::Keyed(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// The scalar value, if this payload is one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// The scalar string, if this payload is one.
    pub fn as_str(&self) -> Option<&str> {
        match self.as_value()? {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The scalar coerced to a number, if it coerces.
    pub fn as_number(&self) -> Option<f64> {
        self.as_value()?.as_number()
    }

    /// Look up a sub-payload of a keyed payload.
    pub fn get(&self, key: &str) -> Option<&Payload> {
        match self {
            Self::Keyed(fields) => fields.get(key),
            _ => None,
        }
    }

    /// Convenience: `get(key)` then [`Payload::as_str`].
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    /// Convenience: `get(key)` then [`Payload::as_number`].
    pub fn number_field(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_number()
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(v) => write!(f, "{v}"),
            Self::Keyed(fields) => {
                let parts: Vec<String> =
                    fields.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Self::Sequence(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Scalar(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Self::Scalar(Value::Str(value.to_string()))
    }
}

impl From<f64> for Payload {
    fn from(value: f64) -> Self {
        Self::Scalar(Value::Number(value))
    }
}

impl From<bool> for Payload {
    fn from(value: bool) -> Self {
        Self::Scalar(Value::Bool(value))
    }
}

/// Returned by action and trigger handlers to control the rest of the
/// batch they run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionFlow {
    /// Keep going.
    #[default]
    Continue,
    /// Short-circuit the remainder of the batch.
    Stop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_maps_shapes() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"music": "theme1", "volume": 0.5, "loop": true}"#).unwrap();
        let payload = Payload::from_json(&json);

        assert_eq!(payload.str_field("music"), Some("theme1"));
        assert_eq!(payload.number_field("volume"), Some(0.5));
        assert_eq!(
            payload.get("loop"),
            Some(&Payload::Scalar(Value::Bool(true)))
        );
    }

    #[test]
    fn arrays_become_sequences() {
        let json: serde_json::Value = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        let payload = Payload::from_json(&json);
        assert_eq!(payload, Payload::Sequence(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn clause_keys_are_reserved() {
        assert!(is_clause_key("if"));
        assert!(is_clause_key("activeOr"));
        assert!(!is_clause_key("music"));
        assert!(!is_clause_key("If"));
    }

    #[test]
    fn display_is_compact() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"id": "gold", "add": 5}"#).unwrap();
        assert_eq!(Payload::from_json(&json).to_string(), "{id: gold, add: 5}");
    }
}
