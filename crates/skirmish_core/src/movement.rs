//! Movement intent and the navigation seam.
//!
//! A unit is either idle (free for autonomous behaviour) or under an explicit
//! move command. Path following itself is delegated to a [`Navigator`]; the
//! intent only polls it for arrival once per tick.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, Vec3Fixed};
use crate::registry::UnitId;

/// Default distance at which a path counts as arrived.
pub const DEFAULT_STOPPING_DISTANCE: f64 = 0.5;

/// Movement state of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MovementIntent {
    /// Not under command. The autonomous controller may drive the unit.
    #[default]
    Idle,
    /// Moving to a player-issued destination.
    Commanded(Vec3Fixed),
}

impl MovementIntent {
    /// Whether an explicit command is in force.
    #[must_use]
    pub const fn is_commanded(&self) -> bool {
        matches!(self, Self::Commanded(_))
    }

    /// Destination of the current command, if any.
    #[must_use]
    pub const fn destination(&self) -> Option<Vec3Fixed> {
        match self {
            Self::Idle => None,
            Self::Commanded(dest) => Some(*dest),
        }
    }

    /// Enter `Commanded`. A new command replaces any previous one.
    pub fn issue_move(&mut self, destination: Vec3Fixed) {
        *self = Self::Commanded(destination);
    }

    /// Poll arrival. Returns true when a command just completed.
    ///
    /// A command completes once the navigator has no path or the remaining
    /// distance is within the stopping distance.
    pub fn refresh(&mut self, has_path: bool, remaining: Fixed, stopping: Fixed) -> bool {
        if !self.is_commanded() {
            return false;
        }
        if !has_path || remaining <= stopping {
            *self = Self::Idle;
            return true;
        }
        false
    }
}

/// Path-following collaborator.
///
/// The core only asks for "go there", "stop", and arrival state. How the
/// route is computed is up to the implementation.
pub trait Navigator {
    /// Start (or replace) a path for `unit` from `from` to `destination`.
    fn navigate_to(&mut self, unit: UnitId, from: Vec3Fixed, destination: Vec3Fixed);

    /// Drop the current path for `unit`, if any.
    fn cancel(&mut self, unit: UnitId);

    /// Whether `unit` has a path in progress.
    fn has_path(&self, unit: UnitId) -> bool;

    /// Distance left on the current path. Zero without a path.
    fn remaining_distance(&self, unit: UnitId) -> Fixed;

    /// Distance at which the path counts as arrived.
    fn stopping_distance(&self, unit: UnitId) -> Fixed;

    /// Move `position` along the path by `speed * dt`.
    fn advance(&mut self, unit: UnitId, position: &mut Vec3Fixed, speed: Fixed, dt: Fixed);

    /// Discard all state kept for a removed unit.
    fn forget(&mut self, unit: UnitId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct DirectPath {
    destination: Vec3Fixed,
    #[serde(with = "fixed_serde")]
    remaining: Fixed,
}

/// Straight-line navigator with no obstacle avoidance.
///
/// Units walk directly at their destination and stop at the stopping
/// distance. The path is kept until cancelled so arrival stays observable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectNavigator {
    paths: BTreeMap<UnitId, DirectPath>,
    #[serde(with = "fixed_serde")]
    stopping_distance: Fixed,
}

impl DirectNavigator {
    /// Create a navigator with the given stopping distance.
    #[must_use]
    pub fn new(stopping_distance: Fixed) -> Self {
        Self {
            paths: BTreeMap::new(),
            stopping_distance: stopping_distance.max(Fixed::ZERO),
        }
    }

    /// Destination of the current path for `unit`.
    #[must_use]
    pub fn destination(&self, unit: UnitId) -> Option<Vec3Fixed> {
        self.paths.get(&unit).map(|p| p.destination)
    }
}

impl Default for DirectNavigator {
    fn default() -> Self {
        Self::new(Fixed::from_num(DEFAULT_STOPPING_DISTANCE))
    }
}

impl Navigator for DirectNavigator {
    fn navigate_to(&mut self, unit: UnitId, from: Vec3Fixed, destination: Vec3Fixed) {
        let remaining = from.distance(destination);
        self.paths.insert(
            unit,
            DirectPath {
                destination,
                remaining,
            },
        );
    }

    fn cancel(&mut self, unit: UnitId) {
        self.paths.remove(&unit);
    }

    fn has_path(&self, unit: UnitId) -> bool {
        self.paths.contains_key(&unit)
    }

    fn remaining_distance(&self, unit: UnitId) -> Fixed {
        self.paths.get(&unit).map_or(Fixed::ZERO, |p| p.remaining)
    }

    fn stopping_distance(&self, _unit: UnitId) -> Fixed {
        self.stopping_distance
    }

    fn advance(&mut self, unit: UnitId, position: &mut Vec3Fixed, speed: Fixed, dt: Fixed) {
        let Some(path) = self.paths.get_mut(&unit) else {
            return;
        };
        let remaining = position.distance(path.destination);
        if remaining <= self.stopping_distance {
            path.remaining = remaining;
            return;
        }
        let travel = speed.saturating_mul(dt);
        let gap = remaining - self.stopping_distance;
        if travel >= gap {
            // Final step lands on the stopping ring; report arrival exactly.
            *position = position.move_towards(path.destination, gap);
            path.remaining = self.stopping_distance;
        } else {
            *position = position.move_towards(path.destination, travel);
            path.remaining = position.distance(path.destination);
        }
    }

    fn forget(&mut self, unit: UnitId) {
        self.paths.remove(&unit);
    }
}
