//! Error types for the core state model.

use thiserror::Error;

/// Errors raised by state mutations and save handling.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A character with this id already exists in the game.
    #[error("duplicate character id: {0}")]
    DuplicateCharacter(String),

    /// No character with this id exists in the game.
    #[error("unknown character id: {0}")]
    UnknownCharacter(String),

    /// A save snapshot failed to serialize or deserialize.
    #[error("save data error: {0}")]
    Save(#[from] serde_json::Error),
}

/// Convenience alias used throughout the core crate.
pub type CoreResult<T> = Result<T, CoreError>;
