//! JSON file persistence for the snapshot mirror.

use std::fs;
use std::path::{Path, PathBuf};

use skirmish_core::error::{GameError, Result};
use skirmish_core::snapshot::{GameStateData, SnapshotStore};
use tracing::info;

/// File name used when only a directory is given.
pub const DEFAULT_FILE_NAME: &str = "gamestate.json";

/// Stores the mirror as pretty-printed JSON in a single file.
///
/// Loading a file that does not exist yields an empty state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store backed by [`DEFAULT_FILE_NAME`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_FILE_NAME))
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(DEFAULT_FILE_NAME)
    }
}

fn persistence(path: &Path, action: &str, err: impl std::fmt::Display) -> GameError {
    GameError::Persistence(format!("{action} {}: {err}", path.display()))
}

impl SnapshotStore for JsonFileStore {
    fn save(&mut self, data: &GameStateData) -> Result<()> {
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| persistence(&self.path, "Failed to encode", e))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| persistence(parent, "Failed to create", e))?;
        }
        fs::write(&self.path, json).map_err(|e| persistence(&self.path, "Failed to write", e))?;
        info!(path = %self.path.display(), units = data.units.len(), "Game state saved");
        Ok(())
    }

    fn load(&self) -> Result<GameStateData> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No save file found, starting from an empty state");
            return Ok(GameStateData::default());
        }
        let json =
            fs::read_to_string(&self.path).map_err(|e| persistence(&self.path, "Failed to read", e))?;
        let data: GameStateData =
            serde_json::from_str(&json).map_err(|e| persistence(&self.path, "Failed to parse", e))?;
        info!(path = %self.path.display(), units = data.units.len(), "Game state loaded");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::registry::Allegiance;
    use skirmish_core::simulation::Simulation;
    use skirmish_test_utils::fixtures::{ground, rifleman, spawn};
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_state() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        assert_eq!(store.path(), dir.path().join("gamestate.json"));
        assert_eq!(store.load().unwrap(), GameStateData::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("saves/slot1.json"));
        let mut sim = Simulation::default();
        spawn(&mut sim, Allegiance::Player, ground(1, 2), rifleman());
        let state = sim.save_state();

        store.save(&state).unwrap();
        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\n  \"units\": ["));
        assert_eq!(store.load().unwrap(), state);
    }

    #[test]
    fn test_corrupt_file_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gamestate.json");
        fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(path);
        assert!(matches!(store.load(), Err(GameError::Persistence(_))));
    }
}
