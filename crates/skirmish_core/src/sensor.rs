//! Proximity-driven target acquisition.
//!
//! The sensor holds at most one hostile target as a non-owning [`UnitId`].
//! It decides *what* changes; the simulation context applies the matching
//! death subscribe/unsubscribe for every [`SensorTransition`] it reports,
//! so a sensor can never enter `Tracking` without being subscribed.
//!
//! Tie-break: the first hostile to enter range is kept until it leaves or
//! dies. A closer or weaker newcomer does not replace it.

use serde::{Deserialize, Serialize};

use crate::registry::{Allegiance, UnitId};

/// Sensor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SensorState {
    /// No target.
    #[default]
    Idle,
    /// Tracking a hostile unit.
    Tracking(UnitId),
}

/// What a sensor call changed. Drives death-subscription bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorTransition {
    /// Nothing changed.
    Unchanged,
    /// `Idle -> Tracking`: subscribe to the new target.
    Acquired(UnitId),
    /// `Tracking -> Idle`: unsubscribe from the old target.
    Released(UnitId),
    /// `Tracking(a) -> Tracking(b)`: unsubscribe from `a`, subscribe to `b`.
    Replaced {
        /// Previous target.
        previous: UnitId,
        /// New target.
        current: UnitId,
    },
}

/// Per-unit target sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSensor {
    allegiance: Allegiance,
    state: SensorState,
}

impl TargetSensor {
    /// Create an idle sensor for a unit of the given allegiance.
    #[must_use]
    pub const fn new(allegiance: Allegiance) -> Self {
        Self {
            allegiance,
            state: SensorState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SensorState {
        self.state
    }

    /// Current target, if tracking.
    #[must_use]
    pub const fn target(&self) -> Option<UnitId> {
        match self.state {
            SensorState::Idle => None,
            SensorState::Tracking(id) => Some(id),
        }
    }

    /// Whether the sensor is tracking `id`.
    #[must_use]
    pub fn is_tracking(&self, id: UnitId) -> bool {
        self.state == SensorState::Tracking(id)
    }

    /// A unit entered the proximity trigger.
    ///
    /// Only hostiles are considered, and only while idle.
    pub fn on_proximity_enter(&mut self, other: UnitId, other_allegiance: Allegiance) -> SensorTransition {
        if !self.allegiance.is_hostile_to(other_allegiance) {
            return SensorTransition::Unchanged;
        }
        match self.state {
            SensorState::Idle => {
                self.state = SensorState::Tracking(other);
                SensorTransition::Acquired(other)
            }
            SensorState::Tracking(_) => SensorTransition::Unchanged,
        }
    }

    /// A unit left the proximity trigger.
    ///
    /// Releases the target only if the leaving unit is the tracked one.
    pub fn on_proximity_exit(&mut self, other: UnitId, other_allegiance: Allegiance) -> SensorTransition {
        if !self.allegiance.is_hostile_to(other_allegiance) || !self.is_tracking(other) {
            return SensorTransition::Unchanged;
        }
        self.state = SensorState::Idle;
        SensorTransition::Released(other)
    }

    /// Explicitly assign a target, superseding proximity acquisition.
    pub fn set_target(&mut self, target: UnitId) -> SensorTransition {
        match self.state {
            SensorState::Tracking(current) if current == target => SensorTransition::Unchanged,
            SensorState::Tracking(previous) => {
                self.state = SensorState::Tracking(target);
                SensorTransition::Replaced {
                    previous,
                    current: target,
                }
            }
            SensorState::Idle => {
                self.state = SensorState::Tracking(target);
                SensorTransition::Acquired(target)
            }
        }
    }

    /// Unconditionally return to idle.
    pub fn clear_target(&mut self) -> SensorTransition {
        match std::mem::take(&mut self.state) {
            SensorState::Idle => SensorTransition::Unchanged,
            SensorState::Tracking(previous) => SensorTransition::Released(previous),
        }
    }

    /// Death notification from a unit this sensor subscribed to.
    pub fn on_target_died(&mut self, dead: UnitId) -> SensorTransition {
        if self.is_tracking(dead) {
            self.state = SensorState::Idle;
            SensorTransition::Released(dead)
        } else {
            SensorTransition::Unchanged
        }
    }
}
