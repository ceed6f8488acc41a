//! Characters and their addressable fields.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A character in the story, with three groups of named numbers.
///
/// The groups carry no engine meaning beyond their names: `attributes`
/// are usually innate traits, `stats` derived values, and `resources`
/// spendable pools. Script text addresses them uniformly through
/// [`Character::field`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Author-assigned identifier, unique within a game.
    pub id: String,
    /// Display name shown to the player.
    pub name: String,
    /// Innate traits, e.g. `strength` or `charm`.
    #[serde(default)]
    pub attributes: IndexMap<String, f64>,
    /// Derived values, e.g. `initiative`.
    #[serde(default)]
    pub stats: IndexMap<String, f64>,
    /// Spendable pools, e.g. `health` or `mana`.
    #[serde(default)]
    pub resources: IndexMap<String, f64>,
}

impl Character {
    /// Create a character with empty field groups.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add an attribute (builder style).
    pub fn with_attribute(mut self, key: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Add a stat (builder style).
    pub fn with_stat(mut self, key: impl Into<String>, value: f64) -> Self {
        self.stats.insert(key.into(), value);
        self
    }

    /// Add a resource (builder style).
    pub fn with_resource(mut self, key: impl Into<String>, value: f64) -> Self {
        self.resources.insert(key.into(), value);
        self
    }

    /// Look up a field by dotted path.
    ///
    /// Recognized paths are `id`, `name`, `attributes.<key>`,
    /// `stats.<key>` and `resources.<key>`. A bare `<key>` searches the
    /// three groups in that order, so `field("health")` finds the
    /// `health` resource when no attribute or stat shadows it.
    pub fn field(&self, path: &str) -> Option<Value> {
        match path {
            "id" => return Some(Value::Str(self.id.clone())),
            "name" => return Some(Value::Str(self.name.clone())),
            _ => {}
        }
        if let Some((group, key)) = path.split_once('.') {
            let group = match group {
                "attributes" => &self.attributes,
                "stats" => &self.stats,
                "resources" => &self.resources,
                _ => return None,
            };
            return group.get(key).copied().map(Value::Number);
        }
        [&self.attributes, &self.stats, &self.resources]
            .into_iter()
            .find_map(|group| group.get(path).copied().map(Value::Number))
    }

    /// Mutable access to a field group member, creating nothing.
    ///
    /// Bare keys search the groups in the same order as [`Character::field`].
    pub fn field_mut(&mut self, path: &str) -> Option<&mut f64> {
        if let Some((group, key)) = path.split_once('.') {
            let group = match group {
                "attributes" => &mut self.attributes,
                "stats" => &mut self.stats,
                "resources" => &mut self.resources,
                _ => return None,
            };
            return group.get_mut(key);
        }
        if self.attributes.contains_key(path) {
            return self.attributes.get_mut(path);
        }
        if self.stats.contains_key(path) {
            return self.stats.get_mut(path);
        }
        self.resources.get_mut(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kaela() -> Character {
        Character::new("kaela", "Kaela")
            .with_attribute("strength", 12.0)
            .with_stat("initiative", 3.0)
            .with_resource("health", 20.0)
    }

    #[test]
    fn field_reads_name_and_id() {
        let c = kaela();
        assert_eq!(c.field("name"), Some(Value::Str("Kaela".into())));
        assert_eq!(c.field("id"), Some(Value::Str("kaela".into())));
    }

    #[test]
    fn field_reads_grouped_paths() {
        let c = kaela();
        assert_eq!(c.field("attributes.strength"), Some(Value::Number(12.0)));
        assert_eq!(c.field("stats.initiative"), Some(Value::Number(3.0)));
        assert_eq!(c.field("resources.health"), Some(Value::Number(20.0)));
        assert_eq!(c.field("attributes.missing"), None);
        assert_eq!(c.field("equipment.sword"), None);
    }

    #[test]
    fn bare_keys_search_groups_in_order() {
        let c = kaela()
            .with_attribute("luck", 1.0)
            .with_resource("luck", 9.0);
        assert_eq!(c.field("luck"), Some(Value::Number(1.0)));
        assert_eq!(c.field("health"), Some(Value::Number(20.0)));
    }

    #[test]
    fn field_mut_writes_through() {
        let mut c = kaela();
        if let Some(health) = c.field_mut("health") {
            *health -= 5.0;
        }
        assert_eq!(c.field("resources.health"), Some(Value::Number(15.0)));
        assert!(c.field_mut("resources.mana").is_none());
    }
}
