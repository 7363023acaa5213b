//! Process-wide catalog of live units.
//!
//! The registry is the source of truth for "who exists". It never owns unit
//! memory (the [`Simulation`](crate::simulation::Simulation) storage does);
//! it only tracks identifiers and allegiance, allocates identifiers, and
//! produces the [`RegistryEvent`]s that the simulation context fans out to
//! every [`RegistryObserver`] within the same call.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::unit::Unit;

/// Process-unique unit identifier.
///
/// Allocated monotonically by the [`Registry`] and never reused, so a stale
/// id can only ever miss a lookup, never alias a newer unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(u64);

impl UnitId {
    /// Wrap a raw identifier value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

/// Closed two-valued allegiance tag.
///
/// Drives both hostility tests and the player/enemy filtering of the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Allegiance {
    /// Controlled by the player.
    Player,
    /// Hostile to the player.
    Enemy,
}

impl Allegiance {
    /// Whether a unit of this allegiance treats `other` as hostile.
    #[must_use]
    pub const fn is_hostile_to(self, other: Self) -> bool {
        !matches!(
            (self, other),
            (Self::Player, Self::Player) | (Self::Enemy, Self::Enemy)
        )
    }

    /// The opposing allegiance.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }

    /// Lowercase tag as used in snapshots.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Enemy => "enemy",
        }
    }
}

impl fmt::Display for Allegiance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Allegiance {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "player" => Ok(Self::Player),
            "enemy" => Ok(Self::Enemy),
            other => Err(GameError::InvalidState(format!(
                "unknown allegiance tag '{other}'"
            ))),
        }
    }
}

/// Lifecycle notification emitted by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A unit joined the live set.
    Registered {
        /// The unit.
        id: UnitId,
        /// Its allegiance.
        allegiance: Allegiance,
    },
    /// A unit left the live set (death or explicit removal).
    Unregistered {
        /// The unit.
        id: UnitId,
        /// Its allegiance.
        allegiance: Allegiance,
    },
}

impl RegistryEvent {
    /// The unit the event refers to.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        match self {
            Self::Registered { id, .. } | Self::Unregistered { id, .. } => *id,
        }
    }
}

/// Anything that keeps derived state in lockstep with the registry.
///
/// Implemented by the snapshot synchronizer and the selection index.
pub trait RegistryObserver {
    /// A unit was registered. The unit is already in live storage.
    fn unit_registered(&mut self, unit: &Unit);

    /// A unit was unregistered. It is no longer in live storage.
    fn unit_unregistered(&mut self, id: UnitId, allegiance: Allegiance);
}

/// Catalog of live unit identifiers.
#[derive(Debug, Clone)]
pub struct Registry {
    /// Live units keyed by id; `BTreeMap` keeps iteration in spawn order.
    live: BTreeMap<UnitId, Allegiance>,
    /// Ids that were registered and have since been removed.
    retired: BTreeSet<UnitId>,
    /// Next identifier to hand out.
    next_id: u64,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            live: BTreeMap::new(),
            retired: BTreeSet::new(),
            next_id: 1,
        }
    }

    /// Allocate a fresh identifier. Identifiers are never reused.
    pub fn allocate_id(&mut self) -> UnitId {
        let id = UnitId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a unit to the live set.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DuplicateUnit`] if the id is live or was live
    /// earlier in this registry's lifetime; the registry is left unchanged.
    pub fn register(&mut self, id: UnitId, allegiance: Allegiance) -> Result<RegistryEvent> {
        if self.live.contains_key(&id) {
            tracing::error!(%id, "duplicate unit registration rejected");
            return Err(GameError::DuplicateUnit(id));
        }
        if self.retired.contains(&id) {
            tracing::error!(%id, "registration of a retired id rejected");
            return Err(GameError::DuplicateUnit(id));
        }
        // Keep externally supplied ids from colliding with future allocations.
        self.next_id = self.next_id.max(id.0.saturating_add(1));
        self.live.insert(id, allegiance);
        tracing::debug!(%id, %allegiance, "unit registered");
        Ok(RegistryEvent::Registered { id, allegiance })
    }

    /// Remove a unit from the live set. Unknown ids are a no-op.
    pub fn unregister(&mut self, id: UnitId) -> Option<RegistryEvent> {
        let allegiance = self.live.remove(&id)?;
        self.retired.insert(id);
        tracing::debug!(%id, %allegiance, "unit unregistered");
        Some(RegistryEvent::Unregistered { id, allegiance })
    }

    /// Check if a unit is live.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.live.contains_key(&id)
    }

    /// Allegiance of a live unit.
    #[must_use]
    pub fn allegiance(&self, id: UnitId) -> Option<Allegiance> {
        self.live.get(&id).copied()
    }

    /// Live units of one allegiance, in registration order.
    #[must_use]
    pub fn by_allegiance(&self, allegiance: Allegiance) -> Vec<UnitId> {
        self.live
            .iter()
            .filter(|(_, tag)| **tag == allegiance)
            .map(|(id, _)| *id)
            .collect()
    }

    /// All live ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.live.keys().copied()
    }

    /// Number of live units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no unit is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
