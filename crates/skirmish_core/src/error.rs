//! Error types for the combat core.

use thiserror::Error;

use crate::registry::UnitId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all core errors.
///
/// None of these are fatal to the simulation: callers skip the failed
/// operation and the tick proceeds.
#[derive(Debug, Error)]
pub enum GameError {
    /// An operation referenced a unit that is not registered.
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    /// A unit identifier was registered twice.
    #[error("Unit {0} is already registered")]
    DuplicateUnit(UnitId),

    /// Data file parsing error.
    #[error("Failed to parse data '{source_name}': {message}")]
    DataParseError {
        /// Name of the source that failed to parse (file path or label).
        source_name: String,
        /// Error message.
        message: String,
    },

    /// Persistence collaborator failed to save or load the mirror.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}
