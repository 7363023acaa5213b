//! # Skirmish Core
//!
//! Combat, targeting and state-sync core for a real-time tactical skirmish.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No floating-point simulation math (uses fixed-point; `f32` appears
//!   only in the snapshot mirror)
//!
//! This separation enables:
//! - Headless runs and scripted scenarios
//! - Persistence and advisory requests from a plain-data mirror
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`registry`] - Live unit catalog and lifecycle events
//! - [`stats`] - Health, combat numbers, death subscribers
//! - [`sensor`] - Proximity-driven target acquisition
//! - [`movement`] - Movement intent and the [`movement::Navigator`] seam
//! - [`combat`] - Cooldown-gated attack resolution
//! - [`controller`] - Autonomous approach-face-attack loop
//! - [`snapshot`] - Plain-data mirror, autosave timer, store trait
//! - [`simulation`] - Simulation context and tick loop
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod clock;
pub mod combat;
pub mod config;
pub mod controller;
pub mod data;
pub mod error;
pub mod math;
pub mod movement;
pub mod proximity;
pub mod registry;
pub mod selection;
pub mod sensor;
pub mod simulation;
pub mod snapshot;
pub mod stats;
pub mod unit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::{mitigated_damage, AttackResult};
    pub use crate::config::SimulationConfig;
    pub use crate::data::UnitDefinition;
    pub use crate::error::{GameError, Result};
    pub use crate::math::{Fixed, Vec3Fixed};
    pub use crate::movement::{DirectNavigator, MovementIntent, Navigator};
    pub use crate::registry::{Allegiance, UnitId};
    pub use crate::sensor::SensorState;
    pub use crate::simulation::{AttackEvent, Simulation, TickEvents};
    pub use crate::snapshot::{GameStateData, SnapshotStore, UnitRecord};
    pub use crate::unit::{Unit, UnitSpawnParams};
}
