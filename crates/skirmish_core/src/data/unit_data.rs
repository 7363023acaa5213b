//! Data-driven unit definitions.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{fixed_serde, Fixed};

/// Authored base stats for a unit type.
///
/// Copied into a unit's runtime [`Stats`](crate::stats::Stats) at spawn.
///
/// # Example RON
///
/// ```ron
/// UnitDefinition(
///     display_name: "Rifleman",
///     base_health: 100,
///     base_attack: 10,
///     base_defense: 5,
///     base_attack_range: 1.0,
///     base_attack_speed: 3.0,
///     base_movement_speed: 3.5,
///     sensor_radius: 10.0,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitDefinition {
    /// Name shown for units of this type.
    pub display_name: String,

    /// Maximum health points.
    pub base_health: u32,

    /// Raw damage per attack before the target's defense.
    pub base_attack: u32,

    /// Flat reduction applied to incoming attacks.
    pub base_defense: u32,

    /// Attack range in world units.
    #[serde(with = "fixed_serde")]
    pub base_attack_range: Fixed,

    /// Cooldown between attacks in seconds.
    #[serde(with = "fixed_serde")]
    pub base_attack_speed: Fixed,

    /// Movement speed in world units per second.
    #[serde(with = "fixed_serde")]
    pub base_movement_speed: Fixed,

    /// Radius of the proximity trigger used for target acquisition.
    #[serde(with = "fixed_serde")]
    pub sensor_radius: Fixed,
}

impl Default for UnitDefinition {
    fn default() -> Self {
        Self {
            display_name: String::new(),
            base_health: 100,
            base_attack: 10,
            base_defense: 5,
            base_attack_range: Fixed::ONE,
            base_attack_speed: Fixed::from_num(3),
            base_movement_speed: Fixed::from_num(3.5),
            sensor_radius: Fixed::from_num(10),
        }
    }
}

impl UnitDefinition {
    /// Parse a definition from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] if the text is not valid RON for
    /// this type.
    pub fn from_ron_str(source_name: &str, ron_text: &str) -> Result<Self> {
        ron::from_str(ron_text).map_err(|e| GameError::DataParseError {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })
    }

    /// Builder method to set the display name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Builder method to set health.
    #[must_use]
    pub const fn with_health(mut self, health: u32) -> Self {
        self.base_health = health;
        self
    }

    /// Builder method to set attack and defense.
    #[must_use]
    pub const fn with_attack(mut self, attack: u32, defense: u32) -> Self {
        self.base_attack = attack;
        self.base_defense = defense;
        self
    }

    /// Builder method to set attack range and cooldown.
    #[must_use]
    pub fn with_weapon(mut self, range: Fixed, attack_speed: Fixed) -> Self {
        self.base_attack_range = range;
        self.base_attack_speed = attack_speed;
        self
    }

    /// Builder method to set movement speed.
    #[must_use]
    pub fn with_speed(mut self, speed: Fixed) -> Self {
        self.base_movement_speed = speed;
        self
    }

    /// Builder method to set sensor radius.
    #[must_use]
    pub fn with_sensor_radius(mut self, radius: Fixed) -> Self {
        self.sensor_radius = radius;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_authoring_template() {
        let def = UnitDefinition::default();
        assert_eq!(def.base_health, 100);
        assert_eq!(def.base_attack, 10);
        assert_eq!(def.base_defense, 5);
        assert_eq!(def.base_attack_range, Fixed::ONE);
        assert_eq!(def.base_attack_speed, Fixed::from_num(3));
        assert_eq!(def.base_movement_speed, Fixed::from_num(3.5));
    }

    #[test]
    fn test_partial_ron_falls_back_to_defaults() {
        let def = UnitDefinition::from_ron_str(
            "inline",
            r#"(display_name: "Heavy", base_health: 250, base_attack_range: 2.5)"#,
        )
        .unwrap();
        assert_eq!(def.display_name, "Heavy");
        assert_eq!(def.base_health, 250);
        assert_eq!(def.base_attack_range, Fixed::from_num(2.5));
        assert_eq!(def.base_defense, 5);
    }

    #[test]
    fn test_bad_ron_reports_source() {
        let err = UnitDefinition::from_ron_str("units/broken.ron", "(base_health: \"lots\")")
            .unwrap_err();
        match err {
            GameError::DataParseError { source_name, .. } => {
                assert_eq!(source_name, "units/broken.ron");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
