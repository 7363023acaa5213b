//! Cooldown-gated attack resolution.
//!
//! Damage model: `actual = max(1, attack - defense)`. A hit is never fully
//! negated by defense.

use crate::math::{Fixed, Vec3Fixed};
use crate::stats::{HealthChange, Stats};

/// Minimum damage dealt by a landed attack.
pub const MIN_DAMAGE: u32 = 1;

/// Damage after flat defense, floored at [`MIN_DAMAGE`].
#[must_use]
pub const fn mitigated_damage(attack: u32, defense: u32) -> u32 {
    let raw = attack.saturating_sub(defense);
    if raw < MIN_DAMAGE {
        MIN_DAMAGE
    } else {
        raw
    }
}

/// Attacker numbers needed for one attack attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackProfile {
    /// Raw attack value.
    pub attack: u32,
    /// Attack range in world units.
    pub range: Fixed,
    /// Cooldown after a landed attack, in ticks.
    pub cooldown_ticks: u64,
}

/// Mutable view of the defender for one attack attempt.
#[derive(Debug)]
pub struct TargetMut<'a> {
    /// Defender position.
    pub position: Vec3Fixed,
    /// Defender stats; damage is applied here.
    pub stats: &'a mut Stats,
}

/// Outcome of [`CombatResolver::try_attack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackResult {
    /// No live target.
    NoTarget,
    /// Cooldown has not elapsed.
    CoolingDown,
    /// Target is beyond attack range.
    OutOfRange,
    /// The attack landed.
    Hit(HealthChange),
}

impl AttackResult {
    /// Whether the attack landed.
    #[must_use]
    pub const fn landed(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// Per-unit attack timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CombatResolver {
    next_attack_tick: u64,
}

impl CombatResolver {
    /// Create a resolver that may attack immediately.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_attack_tick: 0,
        }
    }

    /// Earliest tick at which the next attack may land.
    #[must_use]
    pub const fn next_attack_tick(&self) -> u64 {
        self.next_attack_tick
    }

    /// Whether the cooldown has elapsed at `now`.
    #[must_use]
    pub const fn is_ready(&self, now: u64) -> bool {
        now >= self.next_attack_tick
    }

    /// True iff a target is present and within `range` of `origin`.
    #[must_use]
    pub fn in_range(origin: Vec3Fixed, range: Fixed, target: Option<Vec3Fixed>) -> bool {
        target.is_some_and(|pos| {
            origin.distance_squared(pos) <= range.saturating_mul(range)
        })
    }

    /// Attempt an attack. Only a [`AttackResult::Hit`] has side effects.
    pub fn try_attack(
        &mut self,
        now: u64,
        profile: &AttackProfile,
        origin: Vec3Fixed,
        target: Option<TargetMut<'_>>,
    ) -> AttackResult {
        let Some(target) = target.filter(|t| !t.stats.is_dead()) else {
            return AttackResult::NoTarget;
        };
        if !self.is_ready(now) {
            return AttackResult::CoolingDown;
        }
        if !Self::in_range(origin, profile.range, Some(target.position)) {
            return AttackResult::OutOfRange;
        }

        let damage = mitigated_damage(profile.attack, target.stats.defense());
        let change = target.stats.apply_damage(damage);
        self.next_attack_tick = now.saturating_add(profile.cooldown_ticks);
        AttackResult::Hit(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::UnitDefinition;

    fn profile(attack: u32, range: i32) -> AttackProfile {
        AttackProfile {
            attack,
            range: Fixed::from_num(range),
            cooldown_ticks: 60,
        }
    }

    fn defender(health: u32, defense: u32) -> Stats {
        Stats::from_definition(&UnitDefinition::default().with_health(health).with_attack(0, defense))
    }

    #[test]
    fn test_mitigated_damage_floor() {
        assert_eq!(mitigated_damage(10, 5), 5);
        assert_eq!(mitigated_damage(5, 100), 1);
        assert_eq!(mitigated_damage(0, 0), 1);
    }

    #[test]
    fn test_in_range_boundary() {
        let origin = Vec3Fixed::ZERO;
        let range = Fixed::from_num(2);
        assert!(CombatResolver::in_range(origin, range, Some(Vec3Fixed::from_ints(2, 0, 0))));
        assert!(!CombatResolver::in_range(origin, range, Some(Vec3Fixed::from_ints(2, 0, 1))));
        assert!(!CombatResolver::in_range(origin, range, None));
    }

    #[test]
    fn test_hit_sets_cooldown() {
        let mut resolver = CombatResolver::new();
        let mut stats = defender(100, 5);
        let target = TargetMut {
            position: Vec3Fixed::from_ints(1, 0, 0),
            stats: &mut stats,
        };

        let result = resolver.try_attack(10, &profile(10, 2), Vec3Fixed::ZERO, Some(target));
        assert!(result.landed());
        assert_eq!(resolver.next_attack_tick(), 70);
        assert_eq!(stats.current_health(), 95);
    }

    #[test]
    fn test_failed_attempts_have_no_side_effect() {
        let mut resolver = CombatResolver::new();
        let mut stats = defender(100, 0);

        let far = TargetMut {
            position: Vec3Fixed::from_ints(9, 0, 0),
            stats: &mut stats,
        };
        assert_eq!(
            resolver.try_attack(0, &profile(10, 2), Vec3Fixed::ZERO, Some(far)),
            AttackResult::OutOfRange
        );
        assert_eq!(
            resolver.try_attack(0, &profile(10, 2), Vec3Fixed::ZERO, None),
            AttackResult::NoTarget
        );
        assert_eq!(resolver.next_attack_tick(), 0);
        assert_eq!(stats.current_health(), 100);

        let near = TargetMut {
            position: Vec3Fixed::ZERO,
            stats: &mut stats,
        };
        assert!(resolver.try_attack(0, &profile(10, 2), Vec3Fixed::ZERO, Some(near)).landed());

        for _ in 0..5 {
            let again = TargetMut {
                position: Vec3Fixed::ZERO,
                stats: &mut stats,
            };
            assert_eq!(
                resolver.try_attack(59, &profile(10, 2), Vec3Fixed::ZERO, Some(again)),
                AttackResult::CoolingDown
            );
        }
        assert_eq!(stats.current_health(), 90);
        assert_eq!(resolver.next_attack_tick(), 60);
    }

    #[test]
    fn test_dead_target_counts_as_absent() {
        let mut resolver = CombatResolver::new();
        let mut stats = defender(1, 0);
        stats.apply_damage(1);
        let target = TargetMut {
            position: Vec3Fixed::ZERO,
            stats: &mut stats,
        };
        assert_eq!(
            resolver.try_attack(0, &profile(10, 2), Vec3Fixed::ZERO, Some(target)),
            AttackResult::NoTarget
        );
    }
}
