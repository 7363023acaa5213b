//! Test fixtures and helpers.
//!
//! Pre-built unit definitions, spawn helpers and collaborator doubles for
//! consistent testing.

use std::collections::BTreeMap;

use fixed::types::I32F32;
use skirmish_core::data::UnitDefinition;
use skirmish_core::error::{GameError, Result};
use skirmish_core::math::{Fixed, Vec3Fixed};
use skirmish_core::movement::{DirectNavigator, Navigator};
use skirmish_core::registry::{Allegiance, UnitId};
use skirmish_core::simulation::Simulation;
use skirmish_core::snapshot::{GameStateData, SnapshotStore};
use skirmish_core::unit::UnitSpawnParams;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Point on the ground plane.
#[must_use]
pub fn ground(x: i32, z: i32) -> Vec3Fixed {
    Vec3Fixed::from_ints(x, 0, z)
}

/// Baseline infantry definition (authoring defaults).
#[must_use]
pub fn rifleman() -> UnitDefinition {
    UnitDefinition::default().named("Rifleman")
}

/// Definition with a short weapon and no sensor, for hand-driven targeting.
#[must_use]
pub fn skirmisher(attack: u32, defense: u32, range: i32, attack_speed: i32) -> UnitDefinition {
    UnitDefinition::default()
        .named("Skirmisher")
        .with_attack(attack, defense)
        .with_weapon(fixed(range), fixed(attack_speed))
        .with_sensor_radius(Fixed::ZERO)
}

/// Immobile, unarmed target with the given health and defense.
#[must_use]
pub fn dummy(health: u32, defense: u32) -> UnitDefinition {
    UnitDefinition::default()
        .named("Dummy")
        .with_health(health)
        .with_attack(0, defense)
        .with_speed(Fixed::ZERO)
        .with_sensor_radius(Fixed::ZERO)
}

/// Spawn a unit from a definition at a ground position.
///
/// # Panics
///
/// Panics if the spawn is rejected.
pub fn spawn<N: Navigator>(
    sim: &mut Simulation<N>,
    allegiance: Allegiance,
    position: Vec3Fixed,
    definition: UnitDefinition,
) -> UnitId {
    let name = definition.display_name.clone();
    sim.spawn_unit(UnitSpawnParams::new(name, allegiance, position).with_definition(definition))
        .expect("fixture spawn must succeed")
}

/// Call counts kept by [`RecordingNavigator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigatorCalls {
    /// `navigate_to` calls.
    pub navigate: usize,
    /// `cancel` calls.
    pub cancel: usize,
}

/// Straight-line navigator that counts requests per unit.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    inner: DirectNavigator,
    calls: BTreeMap<UnitId, NavigatorCalls>,
    requested: BTreeMap<UnitId, Vec<Vec3Fixed>>,
}

impl RecordingNavigator {
    /// Create a recording navigator with the default stopping distance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts for one unit.
    #[must_use]
    pub fn calls(&self, unit: UnitId) -> NavigatorCalls {
        self.calls.get(&unit).copied().unwrap_or_default()
    }

    /// Destinations requested for one unit, in order.
    #[must_use]
    pub fn destinations(&self, unit: UnitId) -> &[Vec3Fixed] {
        self.requested.get(&unit).map_or(&[][..], Vec::as_slice)
    }

    /// Reset all counters.
    pub fn clear(&mut self) {
        self.calls.clear();
        self.requested.clear();
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_to(&mut self, unit: UnitId, from: Vec3Fixed, destination: Vec3Fixed) {
        self.calls.entry(unit).or_default().navigate += 1;
        self.requested.entry(unit).or_default().push(destination);
        self.inner.navigate_to(unit, from, destination);
    }

    fn cancel(&mut self, unit: UnitId) {
        self.calls.entry(unit).or_default().cancel += 1;
        self.inner.cancel(unit);
    }

    fn has_path(&self, unit: UnitId) -> bool {
        self.inner.has_path(unit)
    }

    fn remaining_distance(&self, unit: UnitId) -> Fixed {
        self.inner.remaining_distance(unit)
    }

    fn stopping_distance(&self, unit: UnitId) -> Fixed {
        self.inner.stopping_distance(unit)
    }

    fn advance(&mut self, unit: UnitId, position: &mut Vec3Fixed, speed: Fixed, dt: Fixed) {
        self.inner.advance(unit, position, speed, dt);
    }

    fn forget(&mut self, unit: UnitId) {
        self.inner.forget(unit);
    }
}

/// In-memory [`SnapshotStore`], optionally failing every call.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Option<GameStateData>,
    /// Number of successful saves.
    pub saves: usize,
    /// When set, every call returns a persistence error.
    pub fail: bool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose every call fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl SnapshotStore for MemoryStore {
    fn save(&mut self, data: &GameStateData) -> Result<()> {
        if self.fail {
            return Err(GameError::Persistence("memory store is failing".into()));
        }
        self.saved = Some(data.clone());
        self.saves += 1;
        Ok(())
    }

    fn load(&self) -> Result<GameStateData> {
        if self.fail {
            return Err(GameError::Persistence("memory store is failing".into()));
        }
        Ok(self.saved.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_navigator_counts() {
        let mut nav = RecordingNavigator::new();
        let unit = UnitId::from_raw(1);
        nav.navigate_to(unit, Vec3Fixed::ZERO, ground(3, 0));
        nav.navigate_to(unit, Vec3Fixed::ZERO, ground(4, 0));
        nav.cancel(unit);

        assert_eq!(nav.calls(unit), NavigatorCalls { navigate: 2, cancel: 1 });
        assert_eq!(nav.destinations(unit), &[ground(3, 0), ground(4, 0)]);
        assert!(!nav.has_path(unit));
        assert_eq!(nav.calls(UnitId::from_raw(2)), NavigatorCalls::default());
    }

    #[test]
    fn test_memory_store_round_trip_and_failure() {
        let mut store = MemoryStore::new();
        assert!(store.load().unwrap().units.is_empty());
        let data = GameStateData {
            units: Vec::new(),
            game_time: 4.0,
        };
        store.save(&data).unwrap();
        assert_eq!(store.load().unwrap(), data);

        let mut broken = MemoryStore::failing();
        assert!(matches!(broken.save(&data), Err(GameError::Persistence(_))));
    }
}
