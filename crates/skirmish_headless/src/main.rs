//! Headless skirmish runner.
//!
//! Runs scenarios without graphics. Results go to stdout as JSON, logs go
//! to stderr.
//!
//! # Usage
//!
//! ```bash
//! # List built-in scenarios
//! cargo run -p skirmish_headless -- list
//!
//! # Run a scenario, autosaving to saves/gamestate.json
//! cargo run -p skirmish_headless -- run --scenario duel --save saves
//!
//! # Continue from the last autosave
//! cargo run -p skirmish_headless -- run --scenario duel --save saves --resume
//!
//! # Request advice from a local completion server
//! cargo run -p skirmish_headless -- advise --scenario ambush --server-url http://localhost:8080
//!
//! # Summarise a saved mirror
//! cargo run -p skirmish_headless -- inspect --file saves/gamestate.json
//! ```

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use skirmish_advisor::{AdvisorConfig, AdvisoryClient};
use skirmish_core::snapshot::SnapshotStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use skirmish_headless::{
    determinism_hashes,
    runner::{DEFAULT_ADVICE_DELAY_SECS, DEFAULT_ADVICE_PROMPT},
    render_state, HeadlessRunner, JsonFileStore, RunOptions, RunSummary, Scenario,
};

#[derive(Parser)]
#[command(name = "skirmish_headless")]
#[command(about = "Headless skirmish runner for scenario testing and advisory requests")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ScenarioArgs {
    /// Built-in scenario name or path to a RON file
    #[arg(short, long, default_value = "duel")]
    scenario: String,

    /// Maximum ticks to run (20 ticks per second)
    #[arg(short, long, default_value = "2400")]
    ticks: u64,

    /// Keep running after one side is wiped out
    #[arg(long)]
    full: bool,
}

impl ScenarioArgs {
    fn options(&self) -> RunOptions {
        RunOptions {
            max_ticks: self.ticks,
            stop_when_decided: !self.full,
        }
    }
}

#[derive(Args)]
struct AdvisorArgs {
    /// Completion server base URL
    #[arg(long, default_value = "http://localhost:8080")]
    server_url: String,

    /// Model name
    #[arg(long, default_value = "llama-3")]
    model: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,
}

impl AdvisorArgs {
    fn config(&self) -> AdvisorConfig {
        AdvisorConfig {
            server_url: self.server_url.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout,
            ..AdvisorConfig::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in scenarios
    List,

    /// Run a scenario and print the outcome
    Run {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Directory to autosave gamestate.json into
        #[arg(long)]
        save: Option<PathBuf>,

        /// Load the saved state before running
        #[arg(long, requires = "save")]
        resume: bool,
    },

    /// Run a scenario and ask a completion server for advice
    Advise {
        #[command(flatten)]
        scenario: ScenarioArgs,

        #[command(flatten)]
        advisor: AdvisorArgs,

        /// Prompt placed above the game state
        #[arg(long, default_value = DEFAULT_ADVICE_PROMPT)]
        prompt: String,

        /// Seconds into the run before the request is sent
        #[arg(long, default_value_t = DEFAULT_ADVICE_DELAY_SECS)]
        after: u64,
    },

    /// Check that the completion server answers
    Probe {
        #[command(flatten)]
        advisor: AdvisorArgs,
    },

    /// Verify determinism by running the same scenario repeatedly
    Verify {
        #[command(flatten)]
        scenario: ScenarioArgs,

        /// Number of verification runs
        #[arg(short, long, default_value = "3")]
        runs: u32,
    },

    /// Summarise a saved game state
    Inspect {
        /// Saved state file
        #[arg(short, long, default_value = "gamestate.json")]
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr (stdout is for results)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Commands::List => cmd_list(),
        Commands::Run {
            scenario,
            save,
            resume,
        } => cmd_run(&scenario, save, resume),
        Commands::Advise {
            scenario,
            advisor,
            prompt,
            after,
        } => cmd_advise(&scenario, &advisor, prompt, after),
        Commands::Probe { advisor } => cmd_probe(&advisor),
        Commands::Verify { scenario, runs } => cmd_verify(&scenario, runs),
        Commands::Inspect { file } => cmd_inspect(file),
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    process::exit(1);
}

fn load_scenario(args: &ScenarioArgs) -> Scenario {
    Scenario::resolve(&args.scenario).unwrap_or_else(|e| fail(e))
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| fail(format!("Failed to start async runtime: {e}")))
}

fn print_summary(summary: &RunSummary) {
    match serde_json::to_string_pretty(summary) {
        Ok(json) => println!("{json}"),
        Err(e) => fail(format!("Failed to encode summary: {e}")),
    }
}

fn cmd_list() {
    for name in Scenario::builtin_names() {
        match Scenario::builtin(name) {
            Ok(scenario) => println!("{name:<12} {}", scenario.description),
            Err(e) => println!("{name:<12} (broken: {e})"),
        }
    }
}

fn cmd_run(args: &ScenarioArgs, save: Option<PathBuf>, resume: bool) {
    let scenario = load_scenario(args);
    let mut runner = HeadlessRunner::from_scenario(&scenario).unwrap_or_else(|e| fail(e));
    if let Some(dir) = save {
        runner = runner.with_store(JsonFileStore::in_dir(dir));
    }
    if resume {
        if let Err(e) = runner.resume() {
            fail(format!("Failed to resume: {e}"));
        }
    }
    print_summary(&runner.run(&args.options()));
}

fn cmd_advise(args: &ScenarioArgs, advisor: &AdvisorArgs, prompt: String, after: u64) {
    let scenario = load_scenario(args);
    let rt = runtime();
    let client = AdvisoryClient::from_config(advisor.config()).unwrap_or_else(|e| fail(e));
    let at_tick = after * u64::from(scenario.config.tick_rate);

    let mut runner = HeadlessRunner::from_scenario(&scenario)
        .unwrap_or_else(|e| fail(e))
        .with_advice(client, prompt, at_tick, rt.handle().clone());
    let summary = runner.run(&args.options());
    print_summary(&summary);
    if summary.advice.is_none() {
        process::exit(1);
    }
}

fn cmd_probe(advisor: &AdvisorArgs) {
    let rt = runtime();
    let client = AdvisoryClient::from_config(advisor.config()).unwrap_or_else(|e| fail(e));
    tracing::info!("Probing {}", client.config().full_url());
    if rt.block_on(client.test_connection()) {
        eprintln!("PASS: advisory server responded");
    } else {
        fail("FAIL: advisory server did not respond");
    }
}

fn cmd_verify(args: &ScenarioArgs, runs: u32) {
    let scenario = load_scenario(args);
    tracing::info!("Verifying determinism: {} ({} runs)", scenario.name, runs);

    let hashes = determinism_hashes(&scenario, &args.options(), runs).unwrap_or_else(|e| fail(e));
    if hashes.windows(2).all(|w| w[0] == w[1]) {
        eprintln!("PASS: All {runs} runs produced identical results");
    } else {
        fail(format!("FAIL: Non-determinism detected! Hashes: {hashes:?}"));
    }
}

fn cmd_inspect(file: PathBuf) {
    let store = JsonFileStore::new(file);
    let state = store.load().unwrap_or_else(|e| fail(e));
    println!("{}", render_state(state));
}
