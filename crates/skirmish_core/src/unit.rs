//! Units and their storage.
//!
//! A [`Unit`] owns every per-unit sub-object: stats, sensor, movement
//! intent, combat timer and controller. [`UnitStorage`] is the single owner
//! of unit memory; everything else refers to units by [`UnitId`].

use std::collections::HashMap;

use crate::combat::{AttackProfile, CombatResolver};
use crate::controller::AutonomousController;
use crate::data::UnitDefinition;
use crate::math::{Fixed, Vec3Fixed};
use crate::movement::MovementIntent;
use crate::registry::{Allegiance, UnitId};
use crate::sensor::TargetSensor;
use crate::stats::Stats;

/// Parameters for spawning a unit.
#[derive(Debug, Clone)]
pub struct UnitSpawnParams {
    /// Display name. Falls back to the definition's name when empty.
    pub name: String,
    /// Side the unit fights for.
    pub allegiance: Allegiance,
    /// Spawn position.
    pub position: Vec3Fixed,
    /// Authored stats. `None` spawns an inert unit.
    pub definition: Option<UnitDefinition>,
}

impl UnitSpawnParams {
    /// Spawn parameters without a definition.
    #[must_use]
    pub fn new(name: impl Into<String>, allegiance: Allegiance, position: Vec3Fixed) -> Self {
        Self {
            name: name.into(),
            allegiance,
            position,
            definition: None,
        }
    }

    /// Attach a unit definition.
    #[must_use]
    pub fn with_definition(mut self, definition: UnitDefinition) -> Self {
        self.definition = Some(definition);
        self
    }
}

/// A live unit.
#[derive(Debug, Clone)]
pub struct Unit {
    /// Identifier, assigned by the registry.
    pub id: UnitId,
    /// Side the unit fights for.
    pub allegiance: Allegiance,
    /// Display name.
    pub name: String,
    /// World position.
    pub position: Vec3Fixed,
    /// Horizontal facing (unit length, or zero before first turn).
    pub facing: Vec3Fixed,
    /// Health and combat numbers.
    pub stats: Stats,
    /// Current target.
    pub sensor: TargetSensor,
    /// Explicit command state.
    pub movement: MovementIntent,
    /// Attack cooldown.
    pub combat: CombatResolver,
    /// Autonomous behaviour state.
    pub controller: AutonomousController,
}

impl Unit {
    /// Build a unit from spawn parameters.
    #[must_use]
    pub fn new(id: UnitId, params: UnitSpawnParams, repath_interval_ticks: u64) -> Self {
        let name = match (&params.definition, params.name.is_empty()) {
            (Some(def), true) => def.display_name.clone(),
            _ => params.name,
        };
        let stats = Stats::resolve(params.definition.as_ref(), &name);
        Self {
            id,
            allegiance: params.allegiance,
            name,
            position: params.position,
            facing: Vec3Fixed::ZERO,
            stats,
            sensor: TargetSensor::new(params.allegiance),
            movement: MovementIntent::Idle,
            combat: CombatResolver::new(),
            controller: AutonomousController::new(repath_interval_ticks),
        }
    }

    /// Current target, if any.
    #[must_use]
    pub const fn target(&self) -> Option<UnitId> {
        self.sensor.target()
    }

    /// Attack numbers for one attempt, with the cooldown in ticks.
    #[must_use]
    pub fn attack_profile(&self, cooldown_ticks: u64) -> AttackProfile {
        AttackProfile {
            attack: self.stats.attack(),
            range: self.stats.attack_range(),
            cooldown_ticks,
        }
    }

    /// Whether `point` is inside this unit's proximity trigger.
    #[must_use]
    pub fn senses(&self, point: Vec3Fixed) -> bool {
        let radius = self.stats.sensor_radius();
        radius > Fixed::ZERO && self.position.distance_squared(point) <= radius.saturating_mul(radius)
    }
}

/// Storage for all live units.
///
/// Lookup is by hash; deterministic iteration goes through
/// [`UnitStorage::sorted_ids`].
#[derive(Debug, Clone, Default)]
pub struct UnitStorage {
    units: HashMap<UnitId, Unit>,
}

impl UnitStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a unit under its own id, returning any unit it displaced.
    pub fn insert(&mut self, unit: Unit) -> Option<Unit> {
        self.units.insert(unit.id, unit)
    }

    /// Remove a unit by ID.
    pub fn remove(&mut self, id: UnitId) -> Option<Unit> {
        self.units.remove(&id)
    }

    /// Get a unit by ID.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Get a mutable reference to a unit by ID.
    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Check if a unit exists.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    /// Number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Unit IDs in ascending order for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<UnitId> {
        let mut ids: Vec<_> = self.units.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all units (not in deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(raw: u64, params: UnitSpawnParams) -> Unit {
        Unit::new(UnitId::from_raw(raw), params, 4)
    }

    #[test]
    fn test_name_falls_back_to_definition() {
        let def = UnitDefinition::default().named("Grenadier");
        let unit = spawn(
            1,
            UnitSpawnParams::new("", Allegiance::Player, Vec3Fixed::ZERO).with_definition(def.clone()),
        );
        assert_eq!(unit.name, "Grenadier");

        let named = spawn(
            2,
            UnitSpawnParams::new("Sgt. Stone", Allegiance::Player, Vec3Fixed::ZERO).with_definition(def),
        );
        assert_eq!(named.name, "Sgt. Stone");
    }

    #[test]
    fn test_missing_definition_spawns_inert() {
        let unit = spawn(1, UnitSpawnParams::new("stray", Allegiance::Enemy, Vec3Fixed::ZERO));
        assert_eq!(unit.stats.max_health(), 1);
        assert_eq!(unit.stats.attack(), 0);
        assert!(!unit.senses(Vec3Fixed::ZERO));
        assert_eq!(unit.target(), None);
    }

    #[test]
    fn test_storage_sorted_ids() {
        let mut storage = UnitStorage::new();
        for raw in [5, 1, 3] {
            storage.insert(spawn(raw, UnitSpawnParams::new("u", Allegiance::Player, Vec3Fixed::ZERO)));
        }
        let ids: Vec<u64> = storage.sorted_ids().into_iter().map(UnitId::raw).collect();
        assert_eq!(ids, vec![1, 3, 5]);
        assert!(storage.remove(UnitId::from_raw(3)).is_some());
        assert!(!storage.contains(UnitId::from_raw(3)));
        assert_eq!(storage.len(), 2);
    }
}
