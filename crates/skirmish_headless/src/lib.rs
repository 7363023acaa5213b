//! Headless skirmish runner.
//!
//! Loads a RON scenario, drives the simulation for a bounded number of
//! ticks and reports the outcome as JSON on stdout. Along the way it can:
//!
//! - **Autosave** the snapshot mirror to a JSON file every save interval
//! - **Resume** a run from a saved mirror, including in-flight commands
//! - **Ask for advice** by sending a copy of the mirror to a chat-completion
//!   server without pausing the tick loop
//! - **Verify determinism** by comparing state hashes across repeated runs
//!
//! # Example
//!
//! ```bash
//! # Run a built-in scenario with autosave
//! cargo run -p skirmish_headless -- run --scenario duel --save saves/
//!
//! # Ask a local server for advice five seconds into the ambush
//! cargo run -p skirmish_headless -- advise --scenario ambush
//!
//! # Check that three runs hash identically
//! cargo run -p skirmish_headless -- verify --scenario duel --runs 3
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod inspect;
pub mod runner;
pub mod scenario;
pub mod store;

pub use inspect::render_state;
pub use runner::{HeadlessRunner, RunOptions, RunSummary};
pub use scenario::{Order, Scenario, ScenarioError, UnitPlacement};
pub use store::JsonFileStore;

/// Runs `scenario` `runs` times and returns each run's final state hash.
pub fn determinism_hashes(
    scenario: &Scenario,
    options: &RunOptions,
    runs: u32,
) -> Result<Vec<u64>, ScenarioError> {
    (0..runs)
        .map(|_| -> Result<u64, ScenarioError> {
            let mut runner = HeadlessRunner::from_scenario(scenario)?;
            Ok(runner.run(options).state_hash)
        })
        .collect()
}
