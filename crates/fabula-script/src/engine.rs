//! The script engine: owns the registries, the template store, and the
//! configuration. Hosts construct one, wire it up at startup, and hand
//! it state plus text for the rest of the run.

use fabula_core::{FlagStore, GameState, Value};
use indexmap::IndexMap;

use crate::action::{is_clause_key, ActionFlow, ActionMap, Payload};
use crate::choice::{self, Choice, ChoiceSpec};
use crate::condition::{self, GateClause};
use crate::diagnostics::Diagnostic;
use crate::error::{ScriptError, ScriptResult};
use crate::pipeline::{self, Resolution, ResolveOptions};
use crate::registry::{ActionEntry, ConditionEntry, PlaceholderEntry, Registry};

/// Tunables for a [`ScriptEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How deep template references may nest before expansion stops
    /// with an error diagnostic.
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_depth: 8 }
    }
}

impl EngineConfig {
    /// The default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the template nesting limit (builder style).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// The interpreter. One engine serves any number of resolutions; all
/// mutable narrative state lives in the [`GameState`] passed per call.
pub struct ScriptEngine {
    pub(crate) config: EngineConfig,
    pub(crate) conditions: Registry<ConditionEntry>,
    pub(crate) actions: Registry<ActionEntry>,
    pub(crate) placeholders: Registry<PlaceholderEntry>,
    templates: IndexMap<String, IndexMap<String, String>>,
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptEngine {
    /// An engine with default configuration and empty registries.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// An engine with the given configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            conditions: Registry::new("condition"),
            actions: Registry::new("action"),
            placeholders: Registry::new("placeholder"),
            templates: IndexMap::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Register a condition. The name must carry the `_` sigil;
    /// re-registration overwrites and returns a warning.
    pub fn register_condition(
        &mut self,
        name: &str,
        handler: impl Fn(&GameState, &[String]) -> Value + 'static,
    ) -> ScriptResult<Option<Diagnostic>> {
        if !name.starts_with('_') {
            return Err(ScriptError::MissingSigil {
                name: name.to_string(),
            });
        }
        Ok(self.conditions.insert(name, ConditionEntry::new(handler)))
    }

    /// Register an action. Re-registration overwrites and returns a
    /// warning.
    pub fn register_action(&mut self, name: &str, entry: ActionEntry) -> Option<Diagnostic> {
        self.actions.insert(name, entry)
    }

    /// Register a placeholder. Re-registration overwrites and returns a
    /// warning.
    pub fn register_placeholder(
        &mut self,
        name: &str,
        resolver: impl Fn(&GameState, &[String]) -> String + 'static,
    ) -> Option<Diagnostic> {
        self.placeholders.insert(name, PlaceholderEntry::new(resolver))
    }

    /// Store a template fragment. `None` stores it in the default
    /// container.
    pub fn set_template(&mut self, container: Option<&str>, name: &str, text: &str) {
        let container = container.unwrap_or(fabula_core::flags::DEFAULT_CONTAINER);
        self.templates
            .entry(container.to_string())
            .or_default()
            .insert(name.to_string(), text.to_string());
    }

    /// Fetch a stored template.
    pub fn template(&self, container: &str, name: &str) -> Option<&str> {
        self.templates.get(container)?.get(name).map(String::as_str)
    }

    /// Resolve a `name` or `container.name` template reference, the
    /// same scoping rule flag ids use.
    pub(crate) fn template_ref(&self, reference: &str) -> Option<&str> {
        let (container, name) = FlagStore::split_id(reference);
        self.template(container, name)
    }

    /// Iterate stored templates as `(container, name, text)` triples.
    pub fn templates(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.templates.iter().flat_map(|(container, entries)| {
            entries.iter().map(move |(name, text)| {
                (container.as_str(), name.as_str(), text.as_str())
            })
        })
    }

    /// Read-only view of the condition registry.
    pub fn condition_registry(&self) -> &Registry<ConditionEntry> {
        &self.conditions
    }

    /// Read-only view of the action registry.
    pub fn action_registry(&self) -> &Registry<ActionEntry> {
        &self.actions
    }

    /// Read-only view of the placeholder registry.
    pub fn placeholder_registry(&self) -> &Registry<PlaceholderEntry> {
        &self.placeholders
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Resolve one fragment through the full pipeline.
    pub fn resolve(
        &self,
        state: &mut GameState,
        text: &str,
        options: ResolveOptions,
    ) -> Resolution {
        pipeline::run(self, state, text, &options, 0)
    }

    /// Evaluate a visibility or availability gate over a parameter map.
    /// Absent parameters gate nothing and evaluate true.
    pub fn gate(
        &self,
        state: &GameState,
        params: Option<&ActionMap>,
        clause: GateClause,
    ) -> (bool, Vec<Diagnostic>) {
        condition::gate(&self.conditions, state, params, clause)
    }

    /// Evaluate a registered condition directly. Unlike in-text
    /// evaluation there is no safe default here, so an unknown name is
    /// a hard error.
    pub fn condition_value(
        &self,
        state: &GameState,
        name: &str,
        args: &[String],
    ) -> ScriptResult<Value> {
        match self.conditions.get(name) {
            Some(entry) => Ok(entry.evaluate(state, args)),
            None => Err(ScriptError::UnknownCondition {
                name: name.to_string(),
                suggestion: self.conditions.suggest(name),
            }),
        }
    }

    /// Build a choice with its gates evaluated against `state`.
    pub fn build_choice(
        &self,
        state: &GameState,
        spec: ChoiceSpec,
    ) -> (Choice, Vec<Diagnostic>) {
        choice::build(&self.conditions, &self.actions, state, spec)
    }

    // -----------------------------------------------------------------------
    // Action execution
    // -----------------------------------------------------------------------

    /// Execute an action map in authored order.
    ///
    /// Clause keys are skipped, unknown actions are reported and
    /// skipped, deferred entries are skipped when `skip_delayed`, and a
    /// `Sequence` payload invokes its action once per element. An
    /// [`ActionFlow::Stop`] return ends the whole batch.
    pub fn resolve_actions(
        &self,
        state: &mut GameState,
        map: &ActionMap,
        skip_delayed: bool,
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        'batch: for (name, payload) in map {
            if is_clause_key(name) {
                continue;
            }
            let Some(entry) = self.actions.get(name) else {
                diagnostics.push(self.actions.missing(0..0, name));
                continue;
            };
            if skip_delayed && entry.event_delayed {
                continue;
            }
            match payload {
                Payload::Sequence(items) => {
                    for item in items {
                        if entry.execute(state, item) == ActionFlow::Stop {
                            break 'batch;
                        }
                    }
                }
                single => {
                    if entry.execute(state, single) == ActionFlow::Stop {
                        break 'batch;
                    }
                }
            }
        }
        diagnostics
    }

    /// The subset of `map` whose actions are deferred to an explicit
    /// trigger.
    pub fn delayed_actions(&self, map: &ActionMap) -> ActionMap {
        self.filter_actions(map, |entry| entry.event_delayed)
    }

    /// The subset of `map` whose actions re-run when a saved game
    /// loads.
    pub fn reload_actions(&self, map: &ActionMap) -> ActionMap {
        self.filter_actions(map, |entry| entry.on_game_load)
    }

    fn filter_actions(
        &self,
        map: &ActionMap,
        keep: impl Fn(&ActionEntry) -> bool,
    ) -> ActionMap {
        map.iter()
            .filter(|(name, _)| self.actions.get(name).is_some_and(&keep))
            .map(|(name, payload)| (name.clone(), payload.clone()))
            .collect()
    }
}
