//! Choice construction: deriving what the player may see and pick.

use fabula_core::GameState;

use crate::action::ActionMap;
use crate::condition::{gate, GateClause};
use crate::diagnostics::Diagnostic;
use crate::registry::{ActionEntry, ConditionEntry, Registry};
use crate::tolerant;

/// A presentable option, with its gates already evaluated against the
/// state it was built from.
#[derive(Debug, Clone)]
pub struct Choice {
    /// Stable identifier the host uses to act on a selection.
    pub id: String,
    /// The authored name.
    pub name: String,
    /// The label to show. Defaults to `name`; choice modifiers may
    /// rewrite it.
    pub display: String,
    /// The parameter map, executed by the host when the choice is
    /// picked.
    pub params: ActionMap,
    /// Whether the choice is shown at all (`if`/`ifOr` clauses).
    pub visible: bool,
    /// Whether the choice can be picked (`active`/`activeOr` clauses).
    pub available: bool,
}

/// Parameters handed to the builder: already structured, or raw text in
/// the tolerant-JSON dialect.
#[derive(Debug, Clone)]
pub enum ChoiceParams {
    /// A parsed parameter map.
    Map(ActionMap),
    /// Raw parameter text, parsed at build time. Surrounding braces are
    /// optional.
    Raw(String),
}

/// Input to the choice builder.
#[derive(Debug, Clone)]
pub struct ChoiceSpec {
    /// Stable identifier.
    pub id: String,
    /// Authored name, the default display label.
    pub name: String,
    /// Optional parameters carrying clauses and selection actions.
    pub params: Option<ChoiceParams>,
}

impl ChoiceSpec {
    /// A choice with no parameters: always visible, always available.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            params: None,
        }
    }

    /// Attach structured parameters (builder style).
    pub fn with_params(mut self, params: ActionMap) -> Self {
        self.params = Some(ChoiceParams::Map(params));
        self
    }

    /// Attach raw parameter text (builder style).
    pub fn with_raw_params(mut self, raw: impl Into<String>) -> Self {
        self.params = Some(ChoiceParams::Raw(raw.into()));
        self
    }
}

/// Build a choice: parse its parameters, evaluate both gates, then let
/// registered choice modifiers adjust it in parameter order.
pub(crate) fn build(
    conditions: &Registry<ConditionEntry>,
    actions: &Registry<ActionEntry>,
    state: &GameState,
    spec: ChoiceSpec,
) -> (Choice, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let params = match spec.params {
        None => ActionMap::new(),
        Some(ChoiceParams::Map(map)) => map,
        Some(ChoiceParams::Raw(raw)) => {
            let trimmed = raw.trim();
            let braced = if trimmed.starts_with('{') {
                trimmed.to_string()
            } else {
                format!("{{{trimmed}}}")
            };
            match tolerant::parse_tolerant(&braced) {
                Ok(map) => map,
                Err(reason) => {
                    diagnostics.push(Diagnostic::warning(
                        0..raw.len(),
                        format!("unparsable choice parameters for \"{}\": {reason}", spec.id),
                    ));
                    ActionMap::new()
                }
            }
        }
    };

    let (visible, diags) = gate(conditions, state, Some(&params), GateClause::Visibility);
    diagnostics.extend(diags);
    let (available, diags) = gate(conditions, state, Some(&params), GateClause::Availability);
    diagnostics.extend(diags);

    let mut choice = Choice {
        id: spec.id,
        display: spec.name.clone(),
        name: spec.name,
        params,
        visible,
        available,
    };

    // Snapshot so modifiers may mutate the choice while we iterate.
    let entries: Vec<_> = choice
        .params
        .iter()
        .map(|(name, payload)| (name.clone(), payload.clone()))
        .collect();
    for (name, payload) in entries {
        if let Some(entry) = actions.get(&name) {
            if let Some(modifier) = &entry.choice_modifier {
                modifier(&mut choice, &payload);
            }
        }
    }

    (choice, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionFlow, Payload};
    use fabula_core::Value;

    fn conditions() -> Registry<ConditionEntry> {
        Registry::new("condition")
    }

    fn actions() -> Registry<ActionEntry> {
        let mut registry = Registry::new("action");
        registry.insert(
            "goTo",
            ActionEntry::new(|_, _| ActionFlow::Continue).with_choice_modifier(
                |choice, payload| {
                    if let Some(target) = payload.as_str() {
                        choice.display = format!("{} [{target}]", choice.name);
                    }
                },
            ),
        );
        registry
    }

    fn state(gold: f64) -> GameState {
        let mut state = GameState::new();
        state.flags.set("gold", gold);
        state
    }

    #[test]
    fn no_params_means_open_gates() {
        let (choice, diags) = build(
            &conditions(),
            &actions(),
            &state(0.0),
            ChoiceSpec::new("leave", "Leave"),
        );
        assert!(choice.visible);
        assert!(choice.available);
        assert_eq!(choice.display, "Leave");
        assert!(diags.is_empty());
    }

    #[test]
    fn gates_derive_from_clause_pairs() {
        let spec = ChoiceSpec::new("bribe", "Bribe the guard")
            .with_raw_params("if: 'gold >= 0', active: 'gold >= 10'");

        let (rich, _) = build(&conditions(), &actions(), &state(20.0), spec.clone());
        assert!(rich.visible);
        assert!(rich.available);

        let (poor, _) = build(&conditions(), &actions(), &state(5.0), spec);
        assert!(poor.visible);
        assert!(!poor.available);
    }

    #[test]
    fn modifiers_run_in_param_order_and_set_display() {
        let spec =
            ChoiceSpec::new("door", "Open the door").with_raw_params("{goTo: chapel}");
        let (choice, _) = build(&conditions(), &actions(), &state(0.0), spec);
        assert_eq!(choice.display, "Open the door [chapel]");
        assert_eq!(
            choice.params.get("goTo"),
            Some(&Payload::Scalar(Value::Str("chapel".to_string())))
        );
    }

    #[test]
    fn unparsable_params_warn_and_leave_gates_open() {
        let spec = ChoiceSpec::new("odd", "Odd").with_raw_params("{if 'broken}");
        let (choice, diags) = build(&conditions(), &actions(), &state(0.0), spec);
        assert!(choice.visible);
        assert!(choice.params.is_empty());
        assert!(diags
            .iter()
            .any(|d| d.message.contains("unparsable choice parameters")));
    }
}
