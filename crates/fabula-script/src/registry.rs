//! The three registries wiring script names to host callbacks.

use fabula_core::{GameState, Value};
use indexmap::IndexMap;
use strsim::jaro_winkler;

use crate::action::{ActionFlow, Payload};
use crate::choice::Choice;
use crate::diagnostics::Diagnostic;

/// Minimum similarity score for "did you mean" suggestions (0.0-1.0).
const FUZZY_THRESHOLD: f64 = 0.8;

/// Callback evaluating a registered condition.
pub type ConditionFn = dyn Fn(&GameState, &[String]) -> Value;

/// Callback executing a registered action.
pub type ActionFn = dyn Fn(&mut GameState, &Payload) -> ActionFlow;

/// Callback letting an action customize a choice it parameterizes.
pub type ChoiceModifierFn = dyn Fn(&mut Choice, &Payload);

/// Callback producing replacement text for a placeholder.
pub type PlaceholderFn = dyn Fn(&GameState, &[String]) -> String;

/// A registered condition.
pub struct ConditionEntry {
    pub(crate) handler: Box<ConditionFn>,
}

impl ConditionEntry {
    /// Wrap an evaluator closure.
    pub fn new(handler: impl Fn(&GameState, &[String]) -> Value + 'static) -> Self {
        Self {
            handler: Box::new(handler),
        }
    }

    /// Evaluate against the given state.
    pub fn evaluate(&self, state: &GameState, args: &[String]) -> Value {
        (self.handler)(state, args)
    }
}

/// A registered action with its execution-timing flags.
pub struct ActionEntry {
    pub(crate) handler: Box<ActionFn>,
    pub(crate) choice_modifier: Option<Box<ChoiceModifierFn>>,
    /// Deferred until an explicit later trigger; never fired during
    /// text resolution.
    pub event_delayed: bool,
    /// Re-fired when a saved game loads, since its side effects are not
    /// part of the save snapshot.
    pub on_game_load: bool,
}

impl ActionEntry {
    /// Wrap an action closure with default timing (immediate, not re-run
    /// on load).
    pub fn new(handler: impl Fn(&mut GameState, &Payload) -> ActionFlow + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            choice_modifier: None,
            event_delayed: false,
            on_game_load: false,
        }
    }

    /// Defer execution to an explicit trigger (builder style).
    pub fn delayed(mut self) -> Self {
        self.event_delayed = true;
        self
    }

    /// Re-run this action when a saved game loads (builder style).
    pub fn run_on_load(mut self) -> Self {
        self.on_game_load = true;
        self
    }

    /// Attach a choice modifier (builder style).
    pub fn with_choice_modifier(
        mut self,
        modifier: impl Fn(&mut Choice, &Payload) + 'static,
    ) -> Self {
        self.choice_modifier = Some(Box::new(modifier));
        self
    }

    /// Execute against the given state.
    pub fn execute(&self, state: &mut GameState, payload: &Payload) -> ActionFlow {
        (self.handler)(state, payload)
    }
}

/// A registered placeholder.
pub struct PlaceholderEntry {
    pub(crate) resolver: Box<PlaceholderFn>,
}

impl PlaceholderEntry {
    /// Wrap a resolver closure.
    pub fn new(resolver: impl Fn(&GameState, &[String]) -> String + 'static) -> Self {
        Self {
            resolver: Box::new(resolver),
        }
    }

    /// Produce the replacement text.
    pub fn resolve(&self, state: &GameState, args: &[String]) -> String {
        (self.resolver)(state, args)
    }
}

/// Name-to-entry map shared by the three registries.
///
/// Entries are inserted at startup and looked up for the rest of the
/// run. Re-registration overwrites, reported as a warning so hosts
/// see accidental collisions without being stopped by intentional ones.
pub struct Registry<E> {
    kind: &'static str,
    entries: IndexMap<String, E>,
}

impl<E> Registry<E> {
    /// Create an empty registry; `kind` names it in diagnostics
    /// ("condition", "action", "placeholder").
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: IndexMap::new(),
        }
    }

    /// Insert an entry. Returns a warning diagnostic when it overwrites
    /// an existing registration.
    pub fn insert(&mut self, name: impl Into<String>, entry: E) -> Option<Diagnostic> {
        let name = name.into();
        let replaced = self.entries.insert(name.clone(), entry).is_some();
        replaced.then(|| {
            Diagnostic::warning(
                0..0,
                format!("{} \"{name}\" was already registered; overwriting", self.kind),
            )
        })
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&E> {
        self.entries.get(name)
    }

    /// All registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The closest registered name to `input`, if any scores above the
    /// similarity threshold.
    pub fn suggest(&self, input: &str) -> Option<String> {
        let input_lower = input.to_lowercase();
        let mut best: Option<(&str, f64)> = None;
        for name in self.entries.keys() {
            let score = jaro_winkler(&input_lower, &name.to_lowercase());
            if score >= FUZZY_THRESHOLD && best.is_none_or(|(_, s)| score > s) {
                best = Some((name, score));
            }
        }
        best.map(|(name, _)| name.to_string())
    }

    /// Warning diagnostic for a lookup that found nothing, with a fuzzy
    /// suggestion when one is close enough.
    pub fn missing(&self, span: std::ops::Range<usize>, name: &str) -> Diagnostic {
        let mut message = format!("unknown {} \"{name}\"", self.kind);
        if let Some(suggestion) = self.suggest(name) {
            message.push_str(&format!("; did you mean \"{suggestion}\"?"));
        }
        Diagnostic::warning(span, message).with_label(format!("not a registered {}", self.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Registry<ConditionEntry> {
        let mut registry = Registry::new("condition");
        registry.insert("_hasItem", ConditionEntry::new(|_, _| Value::Bool(true)));
        registry.insert("_currentScene", ConditionEntry::new(|_, _| Value::Str(String::new())));
        registry
    }

    #[test]
    fn duplicate_registration_warns_and_overwrites() {
        let mut registry = sample();
        assert!(registry
            .insert("_hasItem", ConditionEntry::new(|_, _| Value::Bool(false)))
            .is_some());
        assert_eq!(registry.len(), 2);

        let state = GameState::new();
        let entry = registry.get("_hasItem").unwrap();
        assert_eq!(entry.evaluate(&state, &[]), Value::Bool(false));
    }

    #[test]
    fn suggest_catches_typos() {
        let registry = sample();
        assert_eq!(registry.suggest("_hasitem"), Some("_hasItem".to_string()));
        assert_eq!(registry.suggest("_hasItm"), Some("_hasItem".to_string()));
        assert_eq!(registry.suggest("_zzz"), None);
    }

    #[test]
    fn missing_mentions_suggestion() {
        let registry = sample();
        let diag = registry.missing(3..10, "_hasItm");
        assert!(diag.message.contains("did you mean \"_hasItem\"?"));
    }
}
