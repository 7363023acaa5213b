//! Sphere-overlap proximity trigger.
//!
//! Each tick the tracker tests every ordered pair `(observer, other)` against
//! the observer's sensor radius and reports the difference from last tick.

use std::collections::BTreeSet;

use crate::registry::UnitId;
use crate::unit::UnitStorage;

/// Overlap change for one observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProximityEvent {
    /// `other` entered `observer`'s trigger.
    Enter {
        /// Unit whose trigger changed.
        observer: UnitId,
        /// Unit that entered.
        other: UnitId,
    },
    /// `other` left `observer`'s trigger.
    Exit {
        /// Unit whose trigger changed.
        observer: UnitId,
        /// Unit that left.
        other: UnitId,
    },
}

/// Tracks which units overlap which triggers.
#[derive(Debug, Clone, Default)]
pub struct ProximityTracker {
    overlaps: BTreeSet<(UnitId, UnitId)>,
}

impl ProximityTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `other` was inside `observer`'s trigger at the last update.
    #[must_use]
    pub fn overlaps(&self, observer: UnitId, other: UnitId) -> bool {
        self.overlaps.contains(&(observer, other))
    }

    /// Recompute overlaps. Exits come before enters, each in id order.
    pub fn update(&mut self, units: &UnitStorage) -> Vec<ProximityEvent> {
        let ids = units.sorted_ids();
        let mut current = BTreeSet::new();
        for &observer_id in &ids {
            let Some(observer) = units.get(observer_id) else {
                continue;
            };
            for &other_id in &ids {
                if other_id == observer_id {
                    continue;
                }
                if let Some(other) = units.get(other_id) {
                    if observer.senses(other.position) {
                        current.insert((observer_id, other_id));
                    }
                }
            }
        }

        let exits = self
            .overlaps
            .difference(&current)
            .map(|&(observer, other)| ProximityEvent::Exit { observer, other });
        let enters = current
            .difference(&self.overlaps)
            .map(|&(observer, other)| ProximityEvent::Enter { observer, other });
        let events = exits.chain(enters).collect();

        self.overlaps = current;
        events
    }

    /// Drop every pair involving a removed unit, without exit events.
    pub fn forget(&mut self, id: UnitId) {
        self.overlaps.retain(|&(a, b)| a != id && b != id);
    }
}
