//! Per-unit combat numbers and health.
//!
//! `Stats` is owned by its unit and is the only place health changes.
//! It also carries the death-subscriber list: every unit whose sensor is
//! tracking this one is listed here, so the death notification can reach
//! all of them before the tick moves on.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::data::UnitDefinition;
use crate::math::{fixed_serde, Fixed};
use crate::registry::UnitId;

/// Result of applying damage to a [`Stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthChange {
    /// Health before the hit.
    pub previous: u32,
    /// Health after the hit.
    pub current: u32,
    /// Health actually removed (never more than `previous`).
    pub dealt: u32,
    /// True exactly once: on the hit that brought health to zero.
    pub died: bool,
}

/// Runtime combat stats of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    max_health: u32,
    current_health: u32,
    attack: u32,
    defense: u32,
    #[serde(with = "fixed_serde")]
    attack_range: Fixed,
    #[serde(with = "fixed_serde")]
    attack_speed: Fixed,
    #[serde(with = "fixed_serde")]
    movement_speed: Fixed,
    #[serde(with = "fixed_serde")]
    sensor_radius: Fixed,
    dead: bool,
    /// Units whose sensor currently tracks this unit.
    #[serde(skip)]
    death_subscribers: BTreeSet<UnitId>,
}

impl Stats {
    /// Build runtime stats from an authored definition at full health.
    ///
    /// A definition with zero health spawns with 1 health so the first hit
    /// kills it through the normal death path.
    #[must_use]
    pub fn from_definition(definition: &UnitDefinition) -> Self {
        let health = if definition.base_health == 0 {
            tracing::warn!(
                definition = %definition.display_name,
                "unit definition has zero health; spawning with 1"
            );
            1
        } else {
            definition.base_health
        };

        Self {
            max_health: health,
            current_health: health,
            attack: definition.base_attack,
            defense: definition.base_defense,
            attack_range: definition.base_attack_range,
            attack_speed: definition.base_attack_speed,
            movement_speed: definition.base_movement_speed,
            sensor_radius: definition.sensor_radius,
            dead: false,
            death_subscribers: BTreeSet::new(),
        }
    }

    /// Minimal safe stats for a unit spawned without a definition.
    ///
    /// The unit is alive but harmless: 1 health, no attack, no range.
    #[must_use]
    pub fn inert() -> Self {
        Self {
            max_health: 1,
            current_health: 1,
            attack: 0,
            defense: 0,
            attack_range: Fixed::ZERO,
            attack_speed: Fixed::ONE,
            movement_speed: Fixed::ONE,
            sensor_radius: Fixed::ZERO,
            dead: false,
            death_subscribers: BTreeSet::new(),
        }
    }

    /// Resolve stats for a spawn, falling back to [`Stats::inert`].
    #[must_use]
    pub fn resolve(definition: Option<&UnitDefinition>, unit_name: &str) -> Self {
        match definition {
            Some(def) => Self::from_definition(def),
            None => {
                tracing::warn!(unit = unit_name, "no unit definition assigned; using inert stats");
                Self::inert()
            }
        }
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> u32 {
        self.max_health
    }

    /// Current health.
    #[must_use]
    pub const fn current_health(&self) -> u32 {
        self.current_health
    }

    /// Raw attack value.
    #[must_use]
    pub const fn attack(&self) -> u32 {
        self.attack
    }

    /// Flat defense value.
    #[must_use]
    pub const fn defense(&self) -> u32 {
        self.defense
    }

    /// Attack range in world units.
    #[must_use]
    pub const fn attack_range(&self) -> Fixed {
        self.attack_range
    }

    /// Attack cooldown in seconds.
    #[must_use]
    pub const fn attack_speed(&self) -> Fixed {
        self.attack_speed
    }

    /// Movement speed in world units per second.
    #[must_use]
    pub const fn movement_speed(&self) -> Fixed {
        self.movement_speed
    }

    /// Proximity trigger radius.
    #[must_use]
    pub const fn sensor_radius(&self) -> Fixed {
        self.sensor_radius
    }

    /// Whether the death transition has happened.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Remove health. Damage on a dead unit changes nothing.
    ///
    /// `actual` is the already-mitigated amount; see
    /// [`mitigated_damage`](crate::combat::mitigated_damage).
    pub fn apply_damage(&mut self, actual: u32) -> HealthChange {
        let previous = self.current_health;
        if self.dead {
            return HealthChange {
                previous,
                current: previous,
                dealt: 0,
                died: false,
            };
        }

        self.current_health = self.current_health.saturating_sub(actual);
        let died = self.current_health == 0;
        if died {
            self.dead = true;
        }

        HealthChange {
            previous,
            current: self.current_health,
            dealt: previous - self.current_health,
            died,
        }
    }

    /// Add a death subscriber. Returns false if it was already subscribed.
    pub fn subscribe_death(&mut self, subscriber: UnitId) -> bool {
        self.death_subscribers.insert(subscriber)
    }

    /// Remove a death subscriber. Returns false if it was not subscribed.
    pub fn unsubscribe_death(&mut self, subscriber: UnitId) -> bool {
        self.death_subscribers.remove(&subscriber)
    }

    /// Whether `subscriber` will be told about this unit's death.
    #[must_use]
    pub fn has_death_subscriber(&self, subscriber: UnitId) -> bool {
        self.death_subscribers.contains(&subscriber)
    }

    /// Current subscribers in ascending id order.
    pub fn death_subscribers(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.death_subscribers.iter().copied()
    }

    /// Drain the subscriber list for delivery of the death notification.
    pub fn take_death_subscribers(&mut self) -> Vec<UnitId> {
        std::mem::take(&mut self.death_subscribers)
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats_with_health(health: u32) -> Stats {
        Stats::from_definition(&UnitDefinition::default().with_health(health))
    }

    #[test]
    fn test_damage_saturates_at_zero() {
        let mut stats = stats_with_health(10);
        let change = stats.apply_damage(25);
        assert_eq!(change.previous, 10);
        assert_eq!(change.current, 0);
        assert_eq!(change.dealt, 10);
        assert!(change.died);
        assert_eq!(stats.current_health(), 0);
    }

    #[test]
    fn test_death_fires_exactly_once() {
        let mut stats = stats_with_health(3);
        assert!(!stats.apply_damage(2).died);
        assert!(stats.apply_damage(1).died);
        let after = stats.apply_damage(5);
        assert!(!after.died);
        assert_eq!(after.dealt, 0);
        assert!(stats.is_dead());
    }

    #[test]
    fn test_zero_health_definition_spawns_alive() {
        let mut stats = stats_with_health(0);
        assert_eq!(stats.max_health(), 1);
        assert_eq!(stats.current_health(), 1);
        assert!(!stats.is_dead());
        assert!(stats.apply_damage(1).died);
    }

    #[test]
    fn test_inert_fallback() {
        let stats = Stats::resolve(None, "misconfigured");
        assert_eq!(stats.max_health(), 1);
        assert_eq!(stats.current_health(), 1);
        assert_eq!(stats.attack(), 0);
        assert_eq!(stats.attack_range(), Fixed::ZERO);
        assert!(!stats.is_dead());
    }

    #[test]
    fn test_subscribe_pairs() {
        let mut stats = stats_with_health(10);
        let a = UnitId::from_raw(7);
        let b = UnitId::from_raw(3);
        assert!(stats.subscribe_death(a));
        assert!(!stats.subscribe_death(a));
        assert!(stats.subscribe_death(b));
        assert!(stats.unsubscribe_death(a));
        assert!(!stats.unsubscribe_death(a));
        assert_eq!(stats.take_death_subscribers(), vec![b]);
        assert_eq!(stats.death_subscribers().count(), 0);
    }
}
