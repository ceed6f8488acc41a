//! Save snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::state::GameState;

/// A timestamped snapshot of a [`GameState`], suitable for writing to
/// disk as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
    /// Optional player-visible label ("Autosave", "Before the duel").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// The captured state.
    pub state: GameState,
}

impl SaveData {
    /// Snapshot a state right now.
    pub fn capture(state: &GameState) -> Self {
        Self {
            saved_at: Utc::now(),
            label: None,
            state: state.clone(),
        }
    }

    /// Attach a label (builder style).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
