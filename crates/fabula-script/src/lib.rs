//! Narrative scripting interpreter for Fabula.
//!
//! Story text is plain prose with four kinds of inline markup: `|name|`
//! placeholders, `|$name|` template references, `{...}` action blocks
//! in tolerant JSON, and flat `if{...}...fi{}` conditional chains. The
//! [`ScriptEngine`] resolves a fragment through a fixed pipeline into a
//! [`Resolution`]: display text, an optional speaker, the actions the
//! fragment carried, and diagnostics for everything that went wrong
//! along the way. Malformed markup degrades, it never panics: bad
//! input costs a diagnostic and the smallest possible piece of output.

/// Action payloads and the `Continue`/`Stop` flow contract.
pub mod action;
/// Flat conditional chains: `if{}` / `ifOr{}` / `else{}` / `fi{}`.
pub mod block;
/// Choices and their gated construction.
pub mod choice;
/// Conditional expression evaluation.
pub mod condition;
/// Diagnostics as data, plus terminal rendering.
pub mod diagnostics;
/// Trigger dispatch for host game events.
pub mod dispatch;
/// The engine: registries, templates, and the resolve entry point.
pub mod engine;
/// Error types for the interpreter.
pub mod error;
/// The text resolution pipeline.
pub mod pipeline;
/// Named registries with fuzzy lookup suggestions.
pub mod registry;
/// Default conditions, actions, and placeholders.
pub mod stdlib;
/// Tolerant-JSON action block extraction.
pub mod tolerant;

pub use action::{ActionFlow, ActionMap, Payload};
pub use choice::{Choice, ChoiceParams, ChoiceSpec};
pub use condition::GateClause;
pub use diagnostics::{Diagnostic, Severity, error_count, render_diagnostics};
pub use dispatch::Trigger;
pub use engine::{EngineConfig, ScriptEngine};
pub use error::{ScriptError, ScriptResult};
pub use pipeline::{Resolution, ResolveOptions};
pub use registry::{ActionEntry, ConditionEntry, PlaceholderEntry, Registry};
pub use stdlib::register_defaults;
