//! Engine defaults: the conditions, actions, and placeholders a host
//! gets out of the box.
//!
//! Everything here is a thin adapter over the core state model. Hosts
//! are expected to override and extend these; overwriting one is a
//! warning, not an error.

use fabula_core::{GameState, Value};

use crate::action::{ActionFlow, Payload};
use crate::diagnostics::Diagnostic;
use crate::engine::ScriptEngine;
use crate::registry::ActionEntry;

/// Install the default registrations, returning any overwrite warnings.
pub fn register_defaults(engine: &mut ScriptEngine) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    // Conditions.
    diagnostics.extend(
        engine
            .register_condition("_hasItem", |state, args| {
                Value::Bool(args.first().is_some_and(|item| state.has_item(item)))
            })
            .unwrap_or_default(),
    );
    diagnostics.extend(
        engine
            .register_condition("_attr", |state, args| {
                character_number(state, args, "attributes")
            })
            .unwrap_or_default(),
    );
    diagnostics.extend(
        engine
            .register_condition("_stat", |state, args| character_number(state, args, "stats"))
            .unwrap_or_default(),
    );
    diagnostics.extend(
        engine
            .register_condition("_resource", |state, args| {
                character_number(state, args, "resources")
            })
            .unwrap_or_default(),
    );
    diagnostics.extend(
        engine
            .register_condition("_selectedChar", |state, _| {
                Value::Str(state.selected_character_id().unwrap_or_default().to_string())
            })
            .unwrap_or_default(),
    );
    diagnostics.extend(
        engine
            .register_condition("_currentScene", |state, _| {
                Value::Str(state.current_scene.clone().unwrap_or_default())
            })
            .unwrap_or_default(),
    );

    // Actions.
    diagnostics.extend(engine.register_action(
        "flag",
        ActionEntry::new(|state, payload| {
            match payload {
                Payload::Keyed(_) => {
                    if let Some(id) = payload.str_field("id") {
                        if let Some(delta) = payload.number_field("add") {
                            state.flags.adjust(id, delta);
                        } else if let Some(value) = payload.number_field("value") {
                            state.flags.set(id, value);
                        }
                    }
                }
                Payload::Scalar(Value::Str(id)) if !id.is_empty() => {
                    state.flags.set(id, 1.0);
                }
                _ => {}
            }
            ActionFlow::Continue
        }),
    ));
    diagnostics.extend(engine.register_action(
        "addItem",
        ActionEntry::new(|state, payload| {
            if let Some(item) = item_id(payload) {
                state.add_item(item);
            }
            ActionFlow::Continue
        }),
    ));
    diagnostics.extend(engine.register_action(
        "removeItem",
        ActionEntry::new(|state, payload| {
            if let Some(item) = item_id(payload) {
                state.remove_item(item);
            }
            ActionFlow::Continue
        }),
    ));
    diagnostics.extend(engine.register_action(
        "selectChar",
        ActionEntry::new(|state, payload| {
            if let Some(id) = payload.as_str() {
                state.select_character(id).ok();
            }
            ActionFlow::Continue
        }),
    ));
    diagnostics.extend(engine.register_action(
        "scene",
        ActionEntry::new(|state, payload| {
            if let Some(id) = payload.as_str() {
                state.current_scene = Some(id.to_string());
            }
            ActionFlow::Continue
        }),
    ));
    diagnostics.extend(engine.register_action(
        "modifyResource",
        ActionEntry::new(|state, payload| {
            let id = payload
                .str_field("char")
                .map(str::to_string)
                .or_else(|| state.selected_character_id().map(str::to_string));
            let (Some(id), Some(resource), Some(delta)) = (
                id,
                payload.str_field("resource"),
                payload.number_field("add"),
            ) else {
                return ActionFlow::Continue;
            };
            if let Some(value) = state
                .character_mut(&id)
                .and_then(|c| c.resources.get_mut(resource))
            {
                *value += delta;
            }
            ActionFlow::Continue
        }),
    ));

    // Placeholders.
    diagnostics.extend(engine.register_placeholder("charName", |state, args| {
        let id = args.first().map(String::as_str).filter(|a| !a.is_empty());
        let character = match id {
            Some(id) => state.character(id),
            None => state.selected_character(),
        };
        character.map(|c| c.name.clone()).unwrap_or_default()
    }));
    diagnostics.extend(engine.register_placeholder("flagValue", |state, args| {
        args.first()
            .map(|id| Value::Number(state.flags.get_or_zero(id)).to_string())
            .unwrap_or_default()
    }));
    diagnostics.extend(engine.register_placeholder("scene", |state, _| {
        state.current_scene.clone().unwrap_or_default()
    }));

    diagnostics
}

/// Character-group lookup shared by `_attr`, `_stat`, and `_resource`:
/// one argument reads the selected character, two name the character
/// first. Anything missing reads as zero.
fn character_number(state: &GameState, args: &[String], group: &str) -> Value {
    let (id, field) = match args {
        [] => return Value::Number(0.0),
        [field] => (state.selected_character_id(), field.as_str()),
        [id, field, ..] => (Some(id.as_str()), field.as_str()),
    };
    let Some(id) = id else {
        return Value::Number(0.0);
    };
    state
        .character(id)
        .and_then(|c| c.field(&format!("{group}.{field}")))
        .unwrap_or(Value::Number(0.0))
}

/// Item payloads are a bare id or `{id: ...}`.
fn item_id(payload: &Payload) -> Option<&str> {
    payload.as_str().or_else(|| payload.str_field("id"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionMap;
    use crate::pipeline::ResolveOptions;
    use fabula_core::Character;

    fn engine() -> ScriptEngine {
        let mut engine = ScriptEngine::new();
        assert!(register_defaults(&mut engine).is_empty());
        engine
    }

    fn state() -> GameState {
        let mut state = GameState::new();
        state
            .add_character(
                Character::new("kaela", "Kaela")
                    .with_attribute("strength", 12.0)
                    .with_resource("health", 20.0),
            )
            .unwrap();
        state.select_character("kaela").unwrap();
        state.add_item("lantern");
        state.current_scene = Some("chapel".to_string());
        state
    }

    #[test]
    fn default_conditions_read_state() {
        let engine = engine();
        let state = state();

        let text = "if{_hasItem(lantern) == true}lit fi{}";
        let resolution = engine.resolve(&mut state.clone(), text, ResolveOptions::default());
        assert_eq!(resolution.output, "lit ");

        assert_eq!(
            engine
                .condition_value(&state, "_attr", &["strength".to_string()])
                .unwrap(),
            Value::Number(12.0)
        );
        assert_eq!(
            engine
                .condition_value(&state, "_resource", &["kaela".to_string(), "health".to_string()])
                .unwrap(),
            Value::Number(20.0)
        );
        assert_eq!(
            engine.condition_value(&state, "_currentScene", &[]).unwrap(),
            Value::Str("chapel".to_string())
        );
    }

    #[test]
    fn flag_action_sets_and_adjusts() {
        let engine = engine();
        let mut state = state();

        let mut map = ActionMap::new();
        map.insert("flag".to_string(), Payload::from("questDone"));
        engine.resolve_actions(&mut state, &map, false);
        assert_eq!(state.flags.get("questDone"), Some(1.0));

        engine.resolve(
            &mut state,
            "{flag: {id: gold, value: 10}}{flag: {id: gold, add: -3}}",
            ResolveOptions::default(),
        );
        assert_eq!(state.flags.get("gold"), Some(7.0));
    }

    #[test]
    fn item_and_scene_actions() {
        let engine = engine();
        let mut state = state();

        engine.resolve(
            &mut state,
            "{addItem: rope}{removeItem: lantern}{scene: crypt}",
            ResolveOptions::default(),
        );
        assert!(state.has_item("rope"));
        assert!(!state.has_item("lantern"));
        assert_eq!(state.current_scene.as_deref(), Some("crypt"));
    }

    #[test]
    fn modify_resource_defaults_to_the_selected_character() {
        let engine = engine();
        let mut state = state();

        engine.resolve(
            &mut state,
            "{modifyResource: {resource: health, add: -5}}",
            ResolveOptions::default(),
        );
        assert_eq!(
            state.character("kaela").unwrap().field("resources.health"),
            Some(Value::Number(15.0))
        );
    }

    #[test]
    fn default_placeholders_render() {
        let engine = engine();
        let mut state = state();
        state.flags.set("gold", 7.0);

        let resolution = engine.resolve(
            &mut state,
            "|charName| has |flagValue(gold)| gold in the |scene|.",
            ResolveOptions::default(),
        );
        assert_eq!(resolution.output, "Kaela has 7 gold in the chapel.");
    }
}
