//! Simulation clock.
//!
//! Time advances in whole ticks. Durations authored in seconds (attack
//! cooldowns, re-path throttle, autosave interval) are converted to ticks
//! once, so every comparison in the tick loop is an exact integer compare.

use serde::{Deserialize, Serialize};

use crate::math::Fixed;

/// Default ticks per second.
pub const TICK_RATE: u32 = 20;

/// Tick counter plus the rate used to convert seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    tick: u64,
    tick_rate: u32,
}

impl SimClock {
    /// Create a clock at tick 0. A zero rate is treated as 1.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        Self {
            tick: 0,
            tick_rate: tick_rate.max(1),
        }
    }

    /// Current tick.
    #[must_use]
    pub const fn now(&self) -> u64 {
        self.tick
    }

    /// Ticks per second.
    #[must_use]
    pub const fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    /// Length of one tick in seconds.
    #[must_use]
    pub fn tick_seconds(&self) -> Fixed {
        Fixed::ONE / Fixed::from_num(self.tick_rate)
    }

    /// Elapsed simulation time in seconds.
    #[must_use]
    pub fn elapsed_seconds(&self) -> Fixed {
        Fixed::saturating_from_num(self.tick) / Fixed::from_num(self.tick_rate)
    }

    /// Convert a duration in seconds to whole ticks, rounding to nearest.
    /// Negative durations are zero.
    #[must_use]
    pub fn seconds_to_ticks(&self, seconds: Fixed) -> u64 {
        if seconds <= Fixed::ZERO {
            return 0;
        }
        let ticks = seconds.saturating_mul(Fixed::from_num(self.tick_rate));
        ticks.round().to_num::<u64>()
    }

    /// Advance by one tick.
    pub fn advance(&mut self) {
        self.tick += 1;
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(TICK_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_to_ticks() {
        let clock = SimClock::default();
        assert_eq!(clock.seconds_to_ticks(Fixed::from_num(3)), 60);
        assert_eq!(clock.seconds_to_ticks(Fixed::from_num(0.2)), 4);
        assert_eq!(clock.seconds_to_ticks(Fixed::from_num(10)), 200);
        assert_eq!(clock.seconds_to_ticks(Fixed::ZERO), 0);
        assert_eq!(clock.seconds_to_ticks(Fixed::from_num(-1)), 0);
    }

    #[test]
    fn test_advance_and_elapsed() {
        let mut clock = SimClock::new(4);
        for _ in 0..6 {
            clock.advance();
        }
        assert_eq!(clock.now(), 6);
        assert_eq!(clock.elapsed_seconds(), Fixed::from_num(1.5));
    }

    #[test]
    fn test_zero_rate_is_clamped() {
        let clock = SimClock::new(0);
        assert_eq!(clock.tick_rate(), 1);
    }
}
