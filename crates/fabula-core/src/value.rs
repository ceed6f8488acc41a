//! The scalar value type shared by flag reads, condition results, and
//! action payload scalars.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar narrative value.
///
/// Script text carries untyped literals; [`Value::parse`] gives them the
/// canonical reading (boolean, else number, else raw string) used everywhere
/// a literal appears in a condition expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A boolean value.
    Bool(bool),
    /// A 64-bit floating-point number. Flags and resources are numeric.
    Number(f64),
    /// A text value.
    Str(String),
}

impl Value {
    /// Parse a raw literal: `true`/`false`, else a number, else the raw string.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => match trimmed.parse::<f64>() {
                Ok(n) => Value::Number(n),
                Err(_) => Value::Str(trimmed.to_string()),
            },
        }
    }

    /// Coerce to a number for ordering comparisons.
    ///
    /// Booleans coerce to 1/0; strings must parse numerically, otherwise
    /// there is no coercion and `None` is returned.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Str(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Loose equality in the scripting sense.
    ///
    /// Same-type operands compare directly (strings as strings). Mixed
    /// operands compare numerically when both sides coerce; a side that
    /// cannot coerce makes the comparison false.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// True if this is the boolean `true` or a value that coerces to it.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_booleans() {
        assert_eq!(Value::parse("true"), Value::Bool(true));
        assert_eq!(Value::parse(" false "), Value::Bool(false));
    }

    #[test]
    fn parse_numbers() {
        assert_eq!(Value::parse("42"), Value::Number(42.0));
        assert_eq!(Value::parse("-1.5"), Value::Number(-1.5));
    }

    #[test]
    fn parse_falls_back_to_string() {
        assert_eq!(Value::parse("Greta"), Value::Str("Greta".to_string()));
        // "True" is not a boolean literal; it stays a string.
        assert_eq!(Value::parse("True"), Value::Str("True".to_string()));
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(Value::Bool(true).as_number(), Some(1.0));
        assert_eq!(Value::Str("3".into()).as_number(), Some(3.0));
        assert_eq!(Value::Str("three".into()).as_number(), None);
    }

    #[test]
    fn loose_equality_same_types() {
        assert!(Value::Str("a".into()).loose_eq(&Value::Str("a".into())));
        assert!(!Value::Str("3".into()).loose_eq(&Value::Str("3.0".into())));
        assert!(Value::Number(3.0).loose_eq(&Value::Number(3.0)));
    }

    #[test]
    fn loose_equality_coerces_mixed_types() {
        assert!(Value::Number(3.0).loose_eq(&Value::Str("3".into())));
        assert!(Value::Bool(true).loose_eq(&Value::Number(1.0)));
        assert!(!Value::Bool(true).loose_eq(&Value::Str("true".into())));
    }

    #[test]
    fn display_numbers_without_trailing_zero() {
        assert_eq!(Value::Number(5.0).to_string(), "5");
        assert_eq!(Value::Number(5.5).to_string(), "5.5");
    }
}
