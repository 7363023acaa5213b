//! Plain-data mirror of live units.
//!
//! The mirror is derived state: it is rebuilt from live units on every
//! [`StateSynchronizer::synchronize`] call and is never read back into the
//! simulation except through an explicit load. Records hold ids, never
//! references, so a copy can be handed to persistence or an async request
//! and outlive any unit it describes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{Fixed, Vec3Fixed};
use crate::registry::{Allegiance, RegistryObserver, UnitId};
use crate::unit::{Unit, UnitStorage};

/// Position as stored in the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordPosition {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate (vertical).
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
}

impl From<Vec3Fixed> for RecordPosition {
    fn from(v: Vec3Fixed) -> Self {
        let [x, y, z] = v.to_f32_array();
        Self { x, y, z }
    }
}

impl From<RecordPosition> for Vec3Fixed {
    fn from(p: RecordPosition) -> Self {
        Self::from_f32_array([p.x, p.y, p.z])
    }
}

/// In-flight move order copied from a unit's movement intent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementCommand {
    /// Destination.
    pub target_position: RecordPosition,
    /// Unit movement speed at the time of the copy.
    pub speed: f32,
}

/// In-flight attack order copied from a unit's sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackCommand {
    /// Unit being attacked.
    pub target_unit_id: UnitId,
    /// Attacker range at the time of the copy.
    pub attack_range: f32,
}

/// Mirror entry for one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    /// Unit identifier.
    pub unit_id: UnitId,
    /// Allegiance tag.
    pub unit_type: Allegiance,
    /// Display name.
    pub unit_name: String,
    /// Last synchronized position.
    pub current_position: RecordPosition,
    /// Move order, if one is in force.
    #[serde(default)]
    pub movement_command: Option<MovementCommand>,
    /// Attack order, if the unit has a target.
    #[serde(default)]
    pub attack_command: Option<AttackCommand>,
    /// Current health.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
    /// Movement speed.
    pub move_speed: f32,
    /// Attack cooldown in seconds.
    pub attack_speed: f32,
}

impl UnitRecord {
    /// Build a record from a live unit.
    #[must_use]
    pub fn from_unit(unit: &Unit) -> Self {
        let mut record = Self {
            unit_id: unit.id,
            unit_type: unit.allegiance,
            unit_name: String::new(),
            current_position: RecordPosition::default(),
            movement_command: None,
            attack_command: None,
            health: 0,
            max_health: 0,
            move_speed: 0.0,
            attack_speed: 0.0,
        };
        record.overwrite_from(unit);
        record
    }

    /// Overwrite every field except the id from the live unit.
    fn overwrite_from(&mut self, unit: &Unit) {
        self.unit_type = unit.allegiance;
        if self.unit_name != unit.name {
            self.unit_name.clone_from(&unit.name);
        }
        self.move_speed = to_f32(unit.stats.movement_speed());
        self.attack_speed = to_f32(unit.stats.attack_speed());
        self.current_position = unit.position.into();
        self.health = unit.stats.current_health();
        self.max_health = unit.stats.max_health();
        self.attack_command = unit.target().map(|target_unit_id| AttackCommand {
            target_unit_id,
            attack_range: to_f32(unit.stats.attack_range()),
        });
        self.movement_command = unit.movement.destination().map(|dest| MovementCommand {
            target_position: dest.into(),
            speed: to_f32(unit.stats.movement_speed()),
        });
    }
}

fn to_f32(value: Fixed) -> f32 {
    value.to_num()
}

/// Serializable mirror: records in registration order plus game time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameStateData {
    /// One record per registered unit.
    pub units: Vec<UnitRecord>,
    /// Accumulated simulation time in seconds.
    pub game_time: f32,
}

/// Keeps a [`GameStateData`] mirror in lockstep with live units.
#[derive(Debug, Clone, Default)]
pub struct StateSynchronizer {
    state: GameStateData,
    lookup: HashMap<UnitId, usize>,
}

impl StateSynchronizer {
    /// Create an empty mirror.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or refresh) the record for a newly registered unit.
    pub fn add_entity(&mut self, unit: &Unit) {
        let record = UnitRecord::from_unit(unit);
        if let Some(&index) = self.lookup.get(&unit.id) {
            tracing::debug!(id = %unit.id, "mirror record already present; overwriting");
            self.state.units[index] = record;
            return;
        }
        self.lookup.insert(unit.id, self.state.units.len());
        self.state.units.push(record);
    }

    /// Drop the record for an unregistered unit. Returns false if absent.
    pub fn remove_entity(&mut self, id: UnitId) -> bool {
        let Some(index) = self.lookup.remove(&id) else {
            return false;
        };
        self.state.units.remove(index);
        self.rebuild_lookup();
        true
    }

    /// Reconcile every record against live units.
    ///
    /// Records whose unit no longer exists are removed after the pass.
    /// Returns how many were removed.
    pub fn synchronize(&mut self, units: &UnitStorage) -> usize {
        let mut stale = Vec::new();
        for record in &mut self.state.units {
            match units.get(record.unit_id) {
                Some(unit) => record.overwrite_from(unit),
                None => stale.push(record.unit_id),
            }
        }

        for id in &stale {
            tracing::warn!(%id, "mirror record has no live unit; removing");
        }
        if !stale.is_empty() {
            self.state.units.retain(|r| !stale.contains(&r.unit_id));
            self.rebuild_lookup();
        }
        stale.len()
    }

    /// Records of one allegiance, in registration order.
    pub fn by_allegiance(&self, allegiance: Allegiance) -> impl Iterator<Item = &UnitRecord> + '_ {
        self.state
            .units
            .iter()
            .filter(move |r| r.unit_type == allegiance)
    }

    /// Record for `id`.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&UnitRecord> {
        self.lookup.get(&id).map(|&i| &self.state.units[i])
    }

    fn get_mut(&mut self, id: UnitId) -> Result<&mut UnitRecord> {
        match self.lookup.get(&id) {
            Some(&i) => Ok(&mut self.state.units[i]),
            None => {
                tracing::warn!(%id, "no mirror record for unit");
                Err(GameError::UnitNotFound(id))
            }
        }
    }

    /// Overwrite a record's position.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] if no record exists.
    pub fn update_position(&mut self, id: UnitId, position: Vec3Fixed) -> Result<()> {
        self.get_mut(id)?.current_position = position.into();
        Ok(())
    }

    /// Overwrite a record's attack command.
    ///
    /// The next [`synchronize`](Self::synchronize) recomputes it from the
    /// live sensor.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] if no record exists.
    pub fn set_attack_command(&mut self, id: UnitId, target: UnitId, range: Fixed) -> Result<()> {
        self.get_mut(id)?.attack_command = Some(AttackCommand {
            target_unit_id: target,
            attack_range: to_f32(range),
        });
        Ok(())
    }

    /// Borrow the mirror.
    #[must_use]
    pub fn state(&self) -> &GameStateData {
        &self.state
    }

    /// Owned copy of the mirror for persistence or async requests.
    #[must_use]
    pub fn snapshot(&self) -> GameStateData {
        self.state.clone()
    }

    /// Replace the mirror and rebuild the lookup index.
    pub fn load(&mut self, data: GameStateData) {
        self.state = data;
        self.rebuild_lookup();
        tracing::info!(units = self.state.units.len(), game_time = self.state.game_time, "mirror loaded");
    }

    /// Add to the game-time accumulator.
    pub fn advance_time(&mut self, seconds: f32) {
        self.state.game_time += seconds;
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.units.len()
    }

    /// Whether the mirror is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.units.is_empty()
    }

    fn rebuild_lookup(&mut self) {
        self.lookup = self
            .state
            .units
            .iter()
            .enumerate()
            .map(|(i, r)| (r.unit_id, i))
            .collect();
    }
}

impl RegistryObserver for StateSynchronizer {
    fn unit_registered(&mut self, unit: &Unit) {
        self.add_entity(unit);
    }

    fn unit_unregistered(&mut self, id: UnitId, _allegiance: Allegiance) {
        self.remove_entity(id);
    }
}

/// Fires every `interval` ticks of simulation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveTimer {
    interval_ticks: u64,
    next_due: u64,
}

impl AutosaveTimer {
    /// Create a timer. A zero interval never fires.
    #[must_use]
    pub const fn new(interval_ticks: u64) -> Self {
        Self {
            interval_ticks,
            next_due: interval_ticks,
        }
    }

    /// Whether a save is due at tick `now`; re-arms when it fires.
    pub fn poll(&mut self, now: u64) -> bool {
        if self.interval_ticks == 0 || now < self.next_due {
            return false;
        }
        self.next_due = now + self.interval_ticks;
        true
    }
}

/// Durable storage for the mirror.
pub trait SnapshotStore {
    /// Persist a mirror copy.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Persistence`] on failure.
    fn save(&mut self, data: &GameStateData) -> Result<()>;

    /// Load the last saved mirror. A store with nothing saved returns an
    /// empty mirror.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Persistence`] on failure.
    fn load(&self) -> Result<GameStateData>;
}
