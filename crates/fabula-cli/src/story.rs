//! Story documents: the JSON files the `fabula` binary loads.
//!
//! A story carries the initial game state (flags, characters,
//! inventory, scene context), a template store, and named text
//! fragments with optional choice lists. Everything except `fragments`
//! is optional, so a minimal story is just a map of named texts.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use fabula_core::{Character, GameState};
use fabula_script::{ActionMap, ChoiceSpec, Payload, ScriptEngine};

/// A loaded story document.
#[derive(Debug, Deserialize)]
pub struct Story {
    /// Title shown when play starts.
    #[serde(default)]
    pub title: Option<String>,
    /// Fragment `play` opens on. Defaults to the first fragment.
    #[serde(default)]
    pub start: Option<String>,
    /// Initial scene id.
    #[serde(default)]
    pub scene: Option<String>,
    /// Initially selected character id.
    #[serde(default)]
    pub selected: Option<String>,
    /// Initial flag values, keyed by `container.key` or a bare key.
    #[serde(default)]
    pub flags: IndexMap<String, f64>,
    /// The cast.
    #[serde(default)]
    pub characters: Vec<Character>,
    /// Starting inventory.
    #[serde(default)]
    pub inventory: Vec<String>,
    /// Stored templates. A string value is one template in the default
    /// container; a map value is a whole named container.
    #[serde(default)]
    pub templates: IndexMap<String, TemplateGroup>,
    /// The named fragments of the story.
    #[serde(default)]
    pub fragments: IndexMap<String, Fragment>,
}

/// One `templates` entry: a single fragment or a container of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TemplateGroup {
    /// A template in the default container.
    Flat(String),
    /// A named container of templates.
    Container(IndexMap<String, String>),
}

/// A named piece of story text plus the choices offered after it.
#[derive(Debug, Deserialize)]
pub struct Fragment {
    /// The scripted text, resolved through the pipeline.
    pub text: String,
    /// Choices offered once the text is shown.
    #[serde(default)]
    pub choices: Vec<StoryChoice>,
}

/// A choice as authored in the story file.
#[derive(Debug, Deserialize)]
pub struct StoryChoice {
    /// Stable identifier.
    pub id: String,
    /// Label shown to the player.
    pub name: String,
    /// Clauses and selection actions, raw or structured.
    #[serde(default)]
    pub params: Option<ParamSpec>,
}

/// Choice parameters: raw tolerant-JSON text or a structured map.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ParamSpec {
    /// Raw text in the tolerant dialect, e.g. `"active: 'gold >= 10'"`.
    Raw(String),
    /// An already structured object.
    Map(serde_json::Map<String, serde_json::Value>),
}

impl Story {
    /// Load a story document from disk.
    pub fn load(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        serde_json::from_str(&raw).map_err(|e| format!("invalid story {}: {e}", path.display()))
    }

    /// Build the initial game state the story describes.
    pub fn build_state(&self) -> Result<GameState, String> {
        let mut state = GameState::new();
        for (id, value) in &self.flags {
            state.flags.set(id, *value);
        }
        for character in &self.characters {
            state
                .add_character(character.clone())
                .map_err(|e| e.to_string())?;
        }
        for item in &self.inventory {
            state.add_item(item);
        }
        state.current_scene = self.scene.clone();
        if let Some(id) = &self.selected {
            state.select_character(id).map_err(|e| e.to_string())?;
        }
        Ok(state)
    }

    /// Install the story's templates into an engine.
    pub fn apply_templates(&self, engine: &mut ScriptEngine) {
        for (name, group) in &self.templates {
            match group {
                TemplateGroup::Flat(text) => engine.set_template(None, name, text),
                TemplateGroup::Container(entries) => {
                    for (key, text) in entries {
                        engine.set_template(Some(name), key, text);
                    }
                }
            }
        }
    }

    /// Look up a fragment by name.
    pub fn fragment(&self, name: &str) -> Result<&Fragment, String> {
        self.fragments
            .get(name)
            .ok_or_else(|| format!("unknown fragment \"{name}\""))
    }

    /// The fragment `play` opens on.
    pub fn start_fragment(&self) -> Option<&str> {
        self.start
            .as_deref()
            .or_else(|| self.fragments.keys().next().map(String::as_str))
    }
}

impl StoryChoice {
    /// Convert to the builder input the engine expects.
    pub fn spec(&self) -> ChoiceSpec {
        let spec = ChoiceSpec::new(&self.id, &self.name);
        match &self.params {
            None => spec,
            Some(ParamSpec::Raw(raw)) => spec.with_raw_params(raw),
            Some(ParamSpec::Map(fields)) => {
                let mut map = ActionMap::new();
                for (key, value) in fields {
                    map.insert(key.clone(), Payload::from_json(value));
                }
                spec.with_params(map)
            }
        }
    }
}
