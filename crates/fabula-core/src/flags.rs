//! Container-scoped numeric flag storage.
//!
//! Flags are the mutable narrative state that condition expressions read.
//! A flag id is either `"flag"` (stored in the default container) or
//! `"container.flag"`, where the first `.` separates the container from
//! the flag name.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Container used for flag ids without an explicit scope.
pub const DEFAULT_CONTAINER: &str = "global";

/// Numeric flags grouped by container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlagStore {
    containers: IndexMap<String, IndexMap<String, f64>>,
}

impl FlagStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a flag id into `(container, flag)`.
    pub fn split_id(id: &str) -> (&str, &str) {
        match id.split_once('.') {
            Some((container, flag)) if !container.is_empty() => (container, flag),
            _ => (DEFAULT_CONTAINER, id),
        }
    }

    /// Read a flag. Returns `None` if it was never set.
    pub fn get(&self, id: &str) -> Option<f64> {
        let (container, flag) = Self::split_id(id);
        self.containers.get(container)?.get(flag).copied()
    }

    /// Read a flag, treating an unset flag as `0.0`.
    pub fn get_or_zero(&self, id: &str) -> f64 {
        self.get(id).unwrap_or(0.0)
    }

    /// Set a flag, creating its container if needed.
    pub fn set(&mut self, id: &str, value: f64) {
        let (container, flag) = Self::split_id(id);
        self.containers
            .entry(container.to_string())
            .or_default()
            .insert(flag.to_string(), value);
    }

    /// Add `delta` to a flag (unset flags start at zero) and return the
    /// new value.
    pub fn adjust(&mut self, id: &str, delta: f64) -> f64 {
        let next = self.get_or_zero(id) + delta;
        self.set(id, next);
        next
    }

    /// Remove a flag. Returns the previous value if it was set.
    pub fn clear(&mut self, id: &str) -> Option<f64> {
        let (container, flag) = Self::split_id(id);
        self.containers.get_mut(container)?.shift_remove(flag)
    }

    /// Total number of flags across all containers.
    pub fn len(&self) -> usize {
        self.containers.values().map(IndexMap::len).sum()
    }

    /// True if no flag has ever been set.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate `(container, flag, value)` triples in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.containers.iter().flat_map(|(container, flags)| {
            flags
                .iter()
                .map(move |(flag, value)| (container.as_str(), flag.as_str(), *value))
        })
    }
}
