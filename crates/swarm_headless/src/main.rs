//! Headless swarm controller runner.
//!
//! Drives the tactical controller for an external simulator over JSON on
//! stdin/stdout, or plays it against itself in the built-in mock arena.
//!
//! # Usage
//!
//! ```bash
//! # Serve an external simulator - read ticks from stdin
//! cargo run -p swarm_headless -- play --config tactics.ron
//!
//! # Play one mock-arena match and record it
//! cargo run -p swarm_headless -- run --scenario duel.ron --record duel.bin
//!
//! # Run every scenario of a directory in parallel
//! cargo run -p swarm_headless -- batch --scenarios scenarios/ --output results.json
//!
//! # Check a recorded match still replays
//! cargo run -p swarm_headless -- verify --scenario duel.ron --log duel.bin
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON requests, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use swarm_core::config::TacticsConfig;
use swarm_core::constants::GameConstants;
use swarm_core::replay::CommandLog;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use swarm_headless::{
    batch::{run_batch, BatchConfig},
    error::RunnerError,
    game_runner::{run_match, verify_log, MatchOptions},
    runner::HeadlessRunner,
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "swarm_headless")]
#[command(about = "Headless runner for the swarm tactical controller")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve one player for an external simulator over stdin/stdout
    Play {
        /// Controller configuration (RON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Game constants (RON), until a tick request replaces them
        #[arg(long)]
        constants: Option<PathBuf>,
    },

    /// Play one match in the mock arena
    Run {
        /// Scenario file, the built-in skirmish when absent
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Override the scenario's tick limit
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Write the command log here
        #[arg(long)]
        record: Option<PathBuf>,

        /// Write the match report (JSON) here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run every scenario of a directory in parallel
    Batch {
        /// Directory of `*.ron` scenarios
        #[arg(short, long)]
        scenarios: PathBuf,

        /// Output file for results
        #[arg(short, long, default_value = "results.json")]
        output: PathBuf,

        /// Worker threads (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: usize,

        /// Override every scenario's tick limit
        #[arg(short, long)]
        ticks: Option<u64>,
    },

    /// Replay a scenario and compare with a recorded command log
    Verify {
        /// Scenario the log was recorded from
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Recorded command log
        #[arg(short, long)]
        log: PathBuf,

        /// Tick limit used when recording
        #[arg(short, long)]
        ticks: Option<u64>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is for protocol
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Some(Commands::Play { config, constants }) => cmd_play(config, constants),
        Some(Commands::Run {
            scenario,
            ticks,
            record,
            output,
        }) => cmd_run(scenario, ticks, record, output),
        Some(Commands::Batch {
            scenarios,
            output,
            parallel,
            ticks,
        }) => cmd_batch(scenarios, output, parallel, ticks),
        Some(Commands::Verify {
            scenario,
            log,
            ticks,
        }) => cmd_verify(scenario, log, ticks),
        None => cmd_play(None, None),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_scenario(path: Option<PathBuf>) -> Result<Scenario, RunnerError> {
    match path {
        Some(path) => Ok(Scenario::load(path)?),
        None => Ok(Scenario::skirmish()),
    }
}

/// Serve an external simulator
fn cmd_play(config: Option<PathBuf>, constants: Option<PathBuf>) -> Result<(), RunnerError> {
    let config = config
        .map(TacticsConfig::load)
        .transpose()?
        .unwrap_or_default();
    let constants = constants
        .map(GameConstants::load)
        .transpose()?
        .unwrap_or_default();

    info!("Starting headless session");
    let mut runner = HeadlessRunner::new(config, constants)?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    runner.serve(stdin.lock(), stdout.lock())?;
    Ok(())
}

/// Play one mock-arena match
fn cmd_run(
    scenario: Option<PathBuf>,
    ticks: Option<u64>,
    record: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), RunnerError> {
    let scenario = load_scenario(scenario)?;
    let outcome = run_match(
        &scenario,
        &MatchOptions {
            max_ticks: ticks,
            record: record.is_some(),
        },
    )?;

    if let (Some(path), Some(log)) = (record, &outcome.log) {
        log.save(&path)?;
        info!(path = %path.display(), entries = log.len(), "Command log saved");
    }

    let json = serde_json::to_string_pretty(&outcome.report)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            info!(path = %path.display(), "Match report saved");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Run a directory of scenarios
fn cmd_batch(
    scenarios: PathBuf,
    output: PathBuf,
    parallel: usize,
    ticks: Option<u64>,
) -> Result<(), RunnerError> {
    let mut config = BatchConfig::new(scenarios).with_parallel(parallel);
    config.max_ticks = ticks;

    let results = run_batch(config)?;
    results.save(&output)?;

    println!();
    println!("Batch Results:");
    println!("  Matches:  {}", results.summary.total);
    println!("  Errors:   {}", results.errors.len());
    println!("  Draws:    {}", results.summary.draws);
    for (name, wins) in &results.summary.wins {
        println!("  {name:<8}: {wins} wins");
    }
    println!("  Avg ticks: {:.0}", results.summary.average_ticks);
    println!("  Output:   {}", output.display());
    Ok(())
}

/// Compare a replay with a recorded log
fn cmd_verify(
    scenario: Option<PathBuf>,
    log: PathBuf,
    ticks: Option<u64>,
) -> Result<(), RunnerError> {
    let scenario = load_scenario(scenario)?;
    let recorded = CommandLog::load(&log)?;
    let verification = verify_log(&scenario, &recorded, ticks)?;

    if verification.matches() {
        println!("✓ Replay matches: {} commands", verification.recorded);
        Ok(())
    } else {
        println!(
            "✗ Replay diverges at entry {:?} ({} recorded, {} replayed)",
            verification.first_divergence, verification.recorded, verification.replayed
        );
        std::process::exit(2);
    }
}
