//! Scenario loading and setup.
//!
//! Scenarios are authored in RON: a set of named unit definitions, the units
//! to place and any orders to hand out before the first tick.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_core::config::SimulationConfig;
use skirmish_core::data::UnitDefinition;
use skirmish_core::error::GameError;
use skirmish_core::math::Vec3Fixed;
use skirmish_core::registry::{Allegiance, UnitId};
use skirmish_core::simulation::Simulation;
use skirmish_core::unit::UnitSpawnParams;
use thiserror::Error;
use tracing::info;

/// Scenarios shipped with the runner, by name.
const BUILTIN: &[(&str, &str)] = &[
    ("duel", include_str!("../scenarios/duel.ron")),
    ("ambush", include_str!("../scenarios/ambush.ron")),
];

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Neither a file nor a built-in scenario.
    #[error("Scenario not found: {0}")]
    NotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// A placement names a definition the scenario does not declare.
    #[error("Unknown unit definition: {0}")]
    UnknownDefinition(String),
    /// An order refers to a placement index past the end of `units`.
    #[error("Order refers to unit #{0}, which is not placed")]
    UnknownUnit(usize),
    /// The simulation rejected a spawn or order.
    #[error(transparent)]
    Game(#[from] GameError),
}

/// One unit to spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// Display name; empty falls back to the definition's name.
    #[serde(default)]
    pub name: String,
    /// Side the unit fights for.
    pub allegiance: Allegiance,
    /// Spawn position.
    pub position: Vec3Fixed,
    /// Key into [`Scenario::definitions`]. `None` spawns an inert unit.
    #[serde(default)]
    pub definition: Option<String>,
}

/// Order handed out before the first tick. Units are referenced by their
/// index in [`Scenario::units`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Order {
    /// Player move command.
    Move {
        /// Placement index.
        unit: usize,
        /// Destination.
        to: Vec3Fixed,
    },
    /// Explicit target assignment.
    Attack {
        /// Placement index of the attacker.
        unit: usize,
        /// Placement index of the target.
        target: usize,
    },
}

/// A complete scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Simulation tuning.
    #[serde(default)]
    pub config: SimulationConfig,
    /// Unit definitions by key.
    #[serde(default)]
    pub definitions: BTreeMap<String, UnitDefinition>,
    /// Units to spawn, in registration order.
    pub units: Vec<UnitPlacement>,
    /// Orders applied after every unit is spawned.
    #[serde(default)]
    pub orders: Vec<Order>,
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::NotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Names of the built-in scenarios.
    pub fn builtin_names() -> impl Iterator<Item = &'static str> {
        BUILTIN.iter().map(|(name, _)| *name)
    }

    /// A built-in scenario by name.
    pub fn builtin(name: &str) -> Result<Self, ScenarioError> {
        BUILTIN
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .ok_or_else(|| ScenarioError::NotFound(name.to_string()))
            .and_then(|(_, ron)| Self::from_ron_str(ron))
    }

    /// Treats `name_or_path` as a file when one exists, otherwise as a
    /// built-in name.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        if Path::new(name_or_path).is_file() {
            Self::load(name_or_path)
        } else {
            Self::builtin(name_or_path)
        }
    }

    /// Spawns every placement and applies the orders.
    ///
    /// Returns the simulation and the spawned ids in placement order.
    pub fn build(&self) -> Result<(Simulation, Vec<UnitId>), ScenarioError> {
        let mut sim = Simulation::new(self.config.clone());
        let mut ids = Vec::with_capacity(self.units.len());

        for placement in &self.units {
            let mut params =
                UnitSpawnParams::new(placement.name.clone(), placement.allegiance, placement.position);
            if let Some(key) = &placement.definition {
                let definition = self
                    .definitions
                    .get(key)
                    .ok_or_else(|| ScenarioError::UnknownDefinition(key.clone()))?;
                params = params.with_definition(definition.clone());
            }
            ids.push(sim.spawn_unit(params)?);
        }

        let placed = |index: usize| ids.get(index).copied().ok_or(ScenarioError::UnknownUnit(index));
        for order in &self.orders {
            match *order {
                Order::Move { unit, to } => sim.issue_move(placed(unit)?, to)?,
                Order::Attack { unit, target } => sim.set_target(placed(unit)?, placed(target)?)?,
            }
        }

        info!(
            scenario = %self.name,
            units = ids.len(),
            orders = self.orders.len(),
            "Scenario ready"
        );
        Ok((sim, ids))
    }
}
