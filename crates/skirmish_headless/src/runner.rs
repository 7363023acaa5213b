//! Tick loop driver for headless runs.

use serde::Serialize;
use skirmish_advisor::{AdvisoryClient, AdvisoryTransport, PendingAdvice, ReqwestTransport};
use skirmish_core::error::{GameError, Result};
use skirmish_core::registry::{Allegiance, UnitId};
use skirmish_core::simulation::Simulation;
use skirmish_core::snapshot::SnapshotStore;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::scenario::{Scenario, ScenarioError};

/// Prompt used when none is given.
pub const DEFAULT_ADVICE_PROMPT: &str =
    "Provide strategic recommendations based on the current game state.";

/// Seconds into a run before advice is requested by default.
pub const DEFAULT_ADVICE_DELAY_SECS: u64 = 5;

/// How long to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Upper bound on ticks.
    pub max_ticks: u64,
    /// Stop as soon as one side has no units left.
    pub stop_when_decided: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_ticks: 2400,
            stop_when_decided: true,
        }
    }
}

/// Outcome of a run, printed as JSON on stdout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Scenario name.
    pub scenario: String,
    /// Ticks executed by this run.
    pub ticks: u64,
    /// Simulation time at the end, in seconds.
    pub game_time: f32,
    /// Attacks that landed.
    pub attacks: usize,
    /// Units destroyed, in order.
    pub deaths: Vec<UnitId>,
    /// Successful autosaves.
    pub saves: usize,
    /// Autosaves the store rejected.
    pub failed_saves: usize,
    /// Surviving player units.
    pub players: usize,
    /// Surviving enemy units.
    pub enemies: usize,
    /// Last side standing, when the run started contested.
    pub winner: Option<Allegiance>,
    /// Final [`Simulation::state_hash`].
    pub state_hash: u64,
    /// Advisory reply, when one was requested and arrived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
    /// Advisory failure, when one was requested and failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice_error: Option<String>,
}

struct AdviceRequest<T> {
    client: AdvisoryClient<T>,
    prompt: String,
    at_tick: u64,
    runtime: Handle,
}

/// Drives a [`Simulation`] for a bounded number of ticks, autosaving to an
/// optional store and optionally asking for advice part-way through.
pub struct HeadlessRunner<T = ReqwestTransport> {
    name: String,
    sim: Simulation,
    store: Option<Box<dyn SnapshotStore>>,
    advice: Option<AdviceRequest<T>>,
}

impl HeadlessRunner<ReqwestTransport> {
    /// Runner over an existing simulation.
    pub fn new(name: impl Into<String>, sim: Simulation) -> Self {
        Self {
            name: name.into(),
            sim,
            store: None,
            advice: None,
        }
    }

    /// Runner over a freshly built scenario.
    pub fn from_scenario(scenario: &Scenario) -> std::result::Result<Self, ScenarioError> {
        let (sim, _) = scenario.build()?;
        Ok(Self::new(scenario.name.clone(), sim))
    }
}

impl<T> HeadlessRunner<T> {
    /// Autosave into `store` whenever a save is due.
    #[must_use]
    pub fn with_store(mut self, store: impl SnapshotStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Request advice once `at_tick` is reached.
    ///
    /// `runtime` must belong to a multi-threaded runtime: the request runs
    /// on its workers while the tick loop keeps going.
    pub fn with_advice<U>(
        self,
        client: AdvisoryClient<U>,
        prompt: impl Into<String>,
        at_tick: u64,
        runtime: Handle,
    ) -> HeadlessRunner<U> {
        HeadlessRunner {
            name: self.name,
            sim: self.sim,
            store: self.store,
            advice: Some(AdviceRequest {
                client,
                prompt: prompt.into(),
                at_tick,
                runtime,
            }),
        }
    }

    /// The simulation being driven.
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Mutable access to the simulation.
    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.sim
    }

    /// Consumes the runner.
    pub fn into_simulation(self) -> Simulation {
        self.sim
    }

    /// Loads the store's mirror into the simulation and resumes its
    /// in-flight commands. Returns how many commands were resumed.
    pub fn resume(&mut self) -> Result<usize> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| GameError::Persistence("no store configured".to_string()))?;
        let data = store.load()?;
        let resumed = self.sim.load_state(data);
        info!(resumed, "Resumed from saved state");
        Ok(resumed)
    }

    fn autosave(&mut self, summary: &mut RunSummary) {
        let Some(store) = self.store.as_mut() else {
            return;
        };
        let state = self.sim.save_state();
        match store.save(&state) {
            Ok(()) => {
                summary.saves += 1;
                debug!(tick = self.sim.now(), "Autosaved");
            }
            Err(e) => {
                summary.failed_saves += 1;
                warn!(tick = self.sim.now(), error = %e, "Autosave failed");
            }
        }
    }

    fn side_counts(&self) -> (usize, usize) {
        let registry = self.sim.registry();
        (
            registry.by_allegiance(Allegiance::Player).len(),
            registry.by_allegiance(Allegiance::Enemy).len(),
        )
    }
}

impl<T: AdvisoryTransport + Clone + 'static> HeadlessRunner<T> {
    fn spawn_advice(&mut self) -> Option<PendingAdvice> {
        let request = self.advice.as_ref()?;
        let state = self.sim.save_state();
        info!(tick = self.sim.now(), "Requesting advice");
        let _guard = request.runtime.enter();
        Some(request.client.spawn_analysis(request.prompt.clone(), state))
    }

    fn record_advice(summary: &mut RunSummary, result: skirmish_advisor::Result<String>) {
        match result {
            Ok(advice) => {
                info!(%advice, "Strategic recommendations");
                summary.advice = Some(advice);
            }
            Err(e) => {
                warn!(error = %e, "Advice request failed");
                summary.advice_error = Some(e.to_string());
            }
        }
    }

    /// Runs until `options.max_ticks` or, when asked, until one side is
    /// wiped out.
    ///
    /// Advice requested during the run is awaited before returning.
    pub fn run(&mut self, options: &RunOptions) -> RunSummary {
        let (players, enemies) = self.side_counts();
        let contested = players > 0 && enemies > 0;
        let mut summary = RunSummary {
            scenario: self.name.clone(),
            ticks: 0,
            game_time: 0.0,
            attacks: 0,
            deaths: Vec::new(),
            saves: 0,
            failed_saves: 0,
            players,
            enemies,
            winner: None,
            state_hash: 0,
            advice: None,
            advice_error: None,
        };
        info!(scenario = %self.name, max_ticks = options.max_ticks, "Starting run");

        let mut pending: Option<PendingAdvice> = None;
        let mut advice_sent = false;

        while summary.ticks < options.max_ticks {
            let due = self
                .advice
                .as_ref()
                .is_some_and(|request| self.sim.now() >= request.at_tick);
            if due && !advice_sent {
                pending = self.spawn_advice();
                advice_sent = true;
            }

            let events = self.sim.tick();
            summary.ticks += 1;
            summary.attacks += events.attacks.len();
            summary.deaths.extend(events.deaths.iter().copied());
            if events.save_due {
                self.autosave(&mut summary);
            }

            if let Some(result) = pending.as_mut().and_then(PendingAdvice::try_take) {
                Self::record_advice(&mut summary, result);
                pending = None;
            }

            if options.stop_when_decided && contested {
                let (players, enemies) = self.side_counts();
                if players == 0 || enemies == 0 {
                    info!(tick = self.sim.now(), "Engagement decided");
                    break;
                }
            }
        }

        if !advice_sent {
            pending = self.spawn_advice();
        }
        if let Some(request) = self.advice.as_ref() {
            if let Some(handle) = pending.take() {
                let result = request.runtime.block_on(handle.wait());
                Self::record_advice(&mut summary, result);
            }
        }

        let (players, enemies) = self.side_counts();
        summary.players = players;
        summary.enemies = enemies;
        summary.winner = match (contested, players, enemies) {
            (true, 0, e) if e > 0 => Some(Allegiance::Enemy),
            (true, p, 0) if p > 0 => Some(Allegiance::Player),
            _ => None,
        };
        summary.game_time = self.sim.synchronizer().state().game_time;
        summary.state_hash = self.sim.state_hash();
        info!(
            ticks = summary.ticks,
            deaths = summary.deaths.len(),
            winner = ?summary.winner,
            "Run complete"
        );
        summary
    }
}
