//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation produces identical
//! results given identical inputs, plus proptest strategies for generating
//! unit setups.
//!
//! Sources of non-determinism the core guards against:
//!
//! - **Floating-point math**: positions, ranges and speeds are
//!   [`skirmish_core::math::Fixed`]; `f32` only appears in the mirror.
//! - **HashMap iteration order**: units are always visited in sorted id
//!   order.

use skirmish_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic,
            "Simulation is non-deterministic!\n\
             Runs: {}\n\
             Ticks: {}\n\
             All hashes: {:?}",
            self.hashes.len(),
            self.ticks,
            self.hashes
        );
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Example
///
/// ```ignore
/// use skirmish_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(3, 200, setup_duel, |sim| { sim.tick(); });
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<Setup, Step>(runs: usize, ticks: u64, setup: Setup, step: Step) -> DeterminismResult
where
    Setup: Fn() -> Simulation,
    Step: Fn(&mut Simulation),
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut sim = setup();
        for _ in 0..ticks {
            step(&mut sim);
        }
        hashes.push(sim.state_hash());
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    tracing::debug!(runs, ticks, is_deterministic, "determinism check finished");

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Proptest strategies for simulation inputs.
pub mod strategies {
    use proptest::prelude::*;
    use skirmish_core::data::UnitDefinition;
    use skirmish_core::math::{Fixed, Vec3Fixed};

    /// Ground-plane coordinate in a skirmish-sized arena.
    pub fn arb_coordinate() -> impl Strategy<Value = i32> {
        -50i32..50i32
    }

    /// Position on the ground plane.
    pub fn arb_ground_position() -> impl Strategy<Value = Vec3Fixed> {
        (arb_coordinate(), arb_coordinate()).prop_map(|(x, z)| Vec3Fixed::from_ints(x, 0, z))
    }

    /// Health values (1-1000).
    pub fn arb_health() -> impl Strategy<Value = u32> {
        1u32..1000u32
    }

    /// Attack or defense values, including zero.
    pub fn arb_combat_value() -> impl Strategy<Value = u32> {
        0u32..200u32
    }

    /// A unit definition with random combat numbers and a short range.
    pub fn arb_definition() -> impl Strategy<Value = UnitDefinition> {
        (arb_health(), arb_combat_value(), arb_combat_value(), 1i32..5, 1i32..4).prop_map(
            |(health, attack, defense, range, cooldown)| {
                UnitDefinition::default()
                    .with_health(health)
                    .with_attack(attack, defense)
                    .with_weapon(Fixed::from_num(range), Fixed::from_num(cooldown))
            },
        )
    }

    /// A list of definitions paired with spawn positions.
    pub fn arb_roster(max_units: usize) -> impl Strategy<Value = Vec<(UnitDefinition, Vec3Fixed)>> {
        proptest::collection::vec((arb_definition(), arb_ground_position()), 1..max_units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ground, rifleman, spawn};
    use skirmish_core::registry::Allegiance;

    fn setup_brawl() -> Simulation {
        let mut sim = Simulation::default();
        for i in 0..4 {
            spawn(&mut sim, Allegiance::Player, ground(i * 2, 0), rifleman());
            spawn(&mut sim, Allegiance::Enemy, ground(i * 2, 8), rifleman());
        }
        sim
    }

    #[test]
    fn test_brawl_is_deterministic() {
        let result = verify_determinism(3, 400, setup_brawl, |sim| {
            sim.tick();
        });
        result.assert_deterministic();
        assert_eq!(result.hashes.len(), 3);
    }
}
