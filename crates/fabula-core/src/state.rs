//! The mutable game state scripts read and write.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::character::Character;
use crate::error::{CoreError, CoreResult};
use crate::flags::FlagStore;

/// Everything a running game mutates: flags, characters, inventory,
/// the current scene and the selected character.
///
/// The whole struct serializes as one snapshot, so saving a game is
/// serializing a `GameState` and loading is deserializing one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Numeric narrative flags, grouped by container.
    pub flags: FlagStore,
    /// Identifier of the scene the player is currently in.
    pub current_scene: Option<String>,
    #[serde(default)]
    characters: IndexMap<String, Character>,
    #[serde(default)]
    inventory: Vec<String>,
    #[serde(default)]
    selected_character: Option<String>,
}

impl GameState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Characters
    // -----------------------------------------------------------------------

    /// Add a character. Ids must be unique within a game.
    pub fn add_character(&mut self, character: Character) -> CoreResult<()> {
        if self.characters.contains_key(&character.id) {
            return Err(CoreError::DuplicateCharacter(character.id));
        }
        self.characters.insert(character.id.clone(), character);
        Ok(())
    }

    /// Get a character by id.
    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.get(id)
    }

    /// Get a mutable character by id.
    pub fn character_mut(&mut self, id: &str) -> Option<&mut Character> {
        self.characters.get_mut(id)
    }

    /// All characters, in insertion order.
    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    /// Mark a character as the one the player currently controls.
    pub fn select_character(&mut self, id: &str) -> CoreResult<()> {
        if !self.characters.contains_key(id) {
            return Err(CoreError::UnknownCharacter(id.to_string()));
        }
        self.selected_character = Some(id.to_string());
        Ok(())
    }

    /// Id of the selected character, if any.
    pub fn selected_character_id(&self) -> Option<&str> {
        self.selected_character.as_deref()
    }

    /// The selected character, if one is selected and still exists.
    pub fn selected_character(&self) -> Option<&Character> {
        self.characters.get(self.selected_character.as_deref()?)
    }

    // -----------------------------------------------------------------------
    // Inventory
    // -----------------------------------------------------------------------

    /// Add an item. Adding an item the player already carries is a no-op.
    pub fn add_item(&mut self, item: &str) {
        if !self.has_item(item) {
            self.inventory.push(item.to_string());
        }
    }

    /// Remove an item. Returns true if the player was carrying it.
    pub fn remove_item(&mut self, item: &str) -> bool {
        let before = self.inventory.len();
        self.inventory.retain(|held| held != item);
        self.inventory.len() != before
    }

    /// True if the player carries the item.
    pub fn has_item(&self, item: &str) -> bool {
        self.inventory.iter().any(|held| held == item)
    }

    /// All carried items, in acquisition order.
    pub fn inventory(&self) -> &[String] {
        &self.inventory
    }
}
