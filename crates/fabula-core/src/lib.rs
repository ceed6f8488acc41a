//! Core game-state model for Fabula: scalar values, container-scoped flags,
//! character sheets, and save snapshots.
//!
//! This crate defines the narrative state that the scripting interpreter
//! reads and mutates. It has no dependency on the interpreter: a
//! [`GameState`] can be constructed programmatically or restored from a
//! serialized [`SaveData`] snapshot.

/// Character sheets with typed field paths.
pub mod character;
/// Error types used throughout the crate.
pub mod error;
/// Container-scoped numeric flag storage.
pub mod flags;
/// Serializable snapshots of the mutable narrative state.
pub mod save;
/// The central mutable state handed to the interpreter.
pub mod state;
/// The scalar value type shared by flags, conditions, and action payloads.
pub mod value;

/// Re-export character types.
pub use character::Character;
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export flag storage.
pub use flags::FlagStore;
/// Re-export save snapshot types.
pub use save::SaveData;
/// Re-export the game state.
pub use state::GameState;
/// Re-export the scalar value type.
pub use value::Value;
