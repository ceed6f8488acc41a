//! Error types for the script interpreter.
//!
//! Hard errors are reserved for misuse of the engine API itself, such
//! as wiring up a condition under an illegal name. Problems inside
//! script text never become errors; those are reported as
//! [`Diagnostic`](crate::diagnostics::Diagnostic)s alongside the result.

use thiserror::Error;

/// Errors raised by the engine API.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Condition names must carry the `_` sigil so they cannot collide
    /// with flag ids in condition expressions.
    #[error("condition name must start with '_': \"{name}\"")]
    MissingSigil {
        /// The rejected name.
        name: String,
    },

    /// A condition was queried by a name nothing registered.
    #[error("unknown condition \"{name}\"{}", .suggestion.as_ref().map(|s| format!("; did you mean \"{s}\"?")).unwrap_or_default())]
    UnknownCondition {
        /// The name that was looked up.
        name: String,
        /// Closest registered name, if any is close enough.
        suggestion: Option<String>,
    },
}

/// Convenience alias used throughout the interpreter crate.
pub type ScriptResult<T> = Result<T, ScriptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_condition_mentions_suggestion() {
        let err = ScriptError::UnknownCondition {
            name: "_hasGld".to_string(),
            suggestion: Some("_hasGold".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "unknown condition \"_hasGld\"; did you mean \"_hasGold\"?"
        );

        let bare = ScriptError::UnknownCondition {
            name: "_zzz".to_string(),
            suggestion: None,
        };
        assert_eq!(bare.to_string(), "unknown condition \"_zzz\"");
    }
}
