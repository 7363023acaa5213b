//! Autonomous approach-face-attack behaviour.
//!
//! The controller only decides. The simulation applies a decision in the
//! fixed order: path action, then facing, then the attack attempt. A unit
//! with a target faces it every tick, pursuing or not.

use crate::math::Vec3Fixed;
use crate::movement::MovementIntent;

/// What to do with the unit's path this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathAction {
    /// Leave the path alone.
    None,
    /// Request a path to this point.
    Navigate(Vec3Fixed),
    /// Cancel the in-flight path.
    Halt,
}

/// One tick of autonomous behaviour for one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerDecision {
    /// Path request, cancellation, or nothing.
    pub path: PathAction,
    /// New horizontal facing, if it should change.
    pub facing: Option<Vec3Fixed>,
    /// Whether to attempt an attack after facing.
    pub attack: bool,
}

/// Per-unit decision loop with a re-path throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutonomousController {
    repath_interval_ticks: u64,
    last_repath: Option<u64>,
}

impl AutonomousController {
    /// Create a controller that re-paths at most once per `repath_interval_ticks`.
    #[must_use]
    pub const fn new(repath_interval_ticks: u64) -> Self {
        Self {
            repath_interval_ticks,
            last_repath: None,
        }
    }

    /// Tick of the last path request, if any.
    #[must_use]
    pub const fn last_repath(&self) -> Option<u64> {
        self.last_repath
    }

    fn repath_due(&self, now: u64) -> bool {
        match self.last_repath {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.repath_interval_ticks,
        }
    }

    /// Decide this tick's behaviour.
    ///
    /// Returns `None` while under explicit command or without a target.
    pub fn decide(
        &mut self,
        now: u64,
        intent: &MovementIntent,
        origin: Vec3Fixed,
        target_position: Option<Vec3Fixed>,
        in_range: bool,
        has_path: bool,
    ) -> Option<ControllerDecision> {
        if intent.is_commanded() {
            return None;
        }
        let target = target_position?;

        let facing = origin.horizontal_direction_to(target);
        let path = if in_range {
            if has_path {
                PathAction::Halt
            } else {
                PathAction::None
            }
        } else if self.repath_due(now) {
            self.last_repath = Some(now);
            PathAction::Navigate(target)
        } else {
            PathAction::None
        };

        Some(ControllerDecision {
            path,
            facing,
            attack: in_range,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Fixed;

    const INTERVAL: u64 = 4;

    fn target() -> Option<Vec3Fixed> {
        Some(Vec3Fixed::from_ints(5, 3, 0))
    }

    #[test]
    fn test_commanded_suppresses_everything() {
        let mut controller = AutonomousController::new(INTERVAL);
        let intent = MovementIntent::Commanded(Vec3Fixed::from_ints(1, 0, 1));
        for now in 0..20 {
            assert!(controller
                .decide(now, &intent, Vec3Fixed::ZERO, target(), true, true)
                .is_none());
        }
        assert_eq!(controller.last_repath(), None);
    }

    #[test]
    fn test_no_target_no_decision() {
        let mut controller = AutonomousController::new(INTERVAL);
        assert!(controller
            .decide(0, &MovementIntent::Idle, Vec3Fixed::ZERO, None, false, false)
            .is_none());
    }

    #[test]
    fn test_repath_is_throttled() {
        let mut controller = AutonomousController::new(INTERVAL);
        let mut requests = Vec::new();
        for now in 0..10 {
            let decision = controller
                .decide(now, &MovementIntent::Idle, Vec3Fixed::ZERO, target(), false, true)
                .unwrap();
            assert!(!decision.attack);
            assert_eq!(decision.facing, Some(Vec3Fixed::from_ints(1, 0, 0)));
            if matches!(decision.path, PathAction::Navigate(_)) {
                requests.push(now);
            }
        }
        assert_eq!(requests, vec![0, 4, 8]);
    }

    #[test]
    fn test_in_range_halts_faces_and_attacks() {
        let mut controller = AutonomousController::new(INTERVAL);
        let decision = controller
            .decide(0, &MovementIntent::Idle, Vec3Fixed::ZERO, target(), true, true)
            .unwrap();
        assert_eq!(decision.path, PathAction::Halt);
        assert!(decision.attack);

        let facing = decision.facing.unwrap();
        assert_eq!(facing.y, Fixed::ZERO);
        assert_eq!(facing.x, Fixed::ONE);

        let without_path = controller
            .decide(1, &MovementIntent::Idle, Vec3Fixed::ZERO, target(), true, false)
            .unwrap();
        assert_eq!(without_path.path, PathAction::None);
    }
}
