//! Simulation tuning.

use serde::{Deserialize, Serialize};

use crate::clock::TICK_RATE;
use crate::error::{GameError, Result};
use crate::math::{fixed_serde, Fixed};
use crate::movement::DEFAULT_STOPPING_DISTANCE;

/// Tunables for a [`Simulation`](crate::simulation::Simulation).
///
/// # Example RON
///
/// ```ron
/// SimulationConfig(
///     tick_rate: 20,
///     ai_update_interval: 0.2,
///     save_interval: 10.0,
///     stopping_distance: 0.5,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Ticks per second.
    pub tick_rate: u32,

    /// Minimum seconds between autonomous path requests per unit.
    #[serde(with = "fixed_serde")]
    pub ai_update_interval: Fixed,

    /// Seconds of simulation time between autosaves. Zero disables autosave.
    #[serde(with = "fixed_serde")]
    pub save_interval: Fixed,

    /// Arrival distance for the default navigator.
    #[serde(with = "fixed_serde")]
    pub stopping_distance: Fixed,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            ai_update_interval: Fixed::from_num(0.2),
            save_interval: Fixed::from_num(10),
            stopping_distance: Fixed::from_num(DEFAULT_STOPPING_DISTANCE),
        }
    }
}

impl SimulationConfig {
    /// Parse a config from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] on malformed input.
    pub fn from_ron_str(source_name: &str, ron_text: &str) -> Result<Self> {
        ron::from_str(ron_text).map_err(|e| GameError::DataParseError {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })
    }
}
