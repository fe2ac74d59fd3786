//! Mock-arena match execution.
//!
//! Plays two controllers against each other in the [`Arena`]: each tick both
//! players decide on their own fog-of-war snapshot, their commands are
//! applied, then the arena advances. Matches end on elimination or at the
//! tick limit.

use serde::{Deserialize, Serialize};
use swarm_core::controller::TacticalController;
use swarm_core::replay::CommandLog;
use swarm_core::units::PlayerId;
use swarm_core::world::Tick;
use tracing::{debug, info};

use crate::arena::{Arena, CommandOutcome, SideStats, PLAYER_IDS};
use crate::error::RunnerError;
use crate::scenario::Scenario;

/// Progress logging interval (ticks).
const PROGRESS_LOG_INTERVAL: Tick = 1000;

/// How a match is run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Overrides the scenario's tick limit.
    pub max_ticks: Option<Tick>,
    /// Keep a command log of every emitted command.
    pub record: bool,
}

/// End-of-match state of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerReport {
    /// Player id in the arena.
    pub player: PlayerId,
    /// Display name from the scenario.
    pub name: String,
    /// Units alive at the end.
    pub units_alive: usize,
    /// Installations owned at the end.
    pub installations: usize,
    /// Arena counters.
    pub stats: SideStats,
}

/// Result of one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Scenario name.
    pub scenario: String,
    /// Ticks played.
    pub ticks: Tick,
    /// Name of the winning player, `None` for a draw.
    pub winner: Option<String>,
    /// `elimination`, `units_remaining` or `draw`.
    pub win_condition: String,
    /// Both players in arena order.
    pub players: Vec<PlayerReport>,
}

/// A report plus the command log when recording was requested.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Match report.
    pub report: MatchReport,
    /// Recorded commands.
    pub log: Option<CommandLog>,
}

/// Outcome of replaying a recorded match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    /// Entries in the recorded log.
    pub recorded: usize,
    /// Entries in the replayed log.
    pub replayed: usize,
    /// Index of the first entry that differs.
    pub first_divergence: Option<usize>,
}

impl Verification {
    /// Whether the replay reproduced the log.
    #[must_use]
    pub fn matches(&self) -> bool {
        self.first_divergence.is_none()
    }
}

/// Run a complete match.
pub fn run_match(scenario: &Scenario, options: &MatchOptions) -> Result<MatchOutcome, RunnerError> {
    scenario.validate()?;
    let max_ticks = options.max_ticks.unwrap_or(scenario.max_ticks);
    info!(
        scenario = %scenario.name,
        max_ticks,
        record = options.record,
        "Starting match"
    );

    let mut arena = Arena::from_scenario(scenario);
    let mut controllers = scenario
        .players
        .iter()
        .map(|p| TacticalController::new(p.config.clone().unwrap_or_default()))
        .collect::<Result<Vec<_>, _>>()?;
    let mut log = options.record.then(|| CommandLog::new(scenario.name.clone()));

    let mut survivor = None;
    while arena.tick() < max_ticks {
        let tick = arena.tick();
        for (player, controller) in PLAYER_IDS.iter().copied().zip(controllers.iter_mut()) {
            let world = arena.snapshot_for(player);
            let constants = arena.constants().clone();
            let Some(command) = controller.decide(&world, &constants) else {
                continue;
            };
            if arena.apply(player, &command) == CommandOutcome::Accepted {
                debug!(tick, player, ?command, "Command applied");
            }
            if let Some(log) = log.as_mut() {
                log.record(tick, player, command);
            }
        }
        arena.step();

        if arena.tick() % PROGRESS_LOG_INTERVAL == 0 {
            info!(
                tick = arena.tick(),
                units_a = arena.alive_units(PLAYER_IDS[0]),
                units_b = arena.alive_units(PLAYER_IDS[1]),
                "Match progress"
            );
        }
        survivor = arena.survivor();
        if survivor.is_some() {
            break;
        }
    }

    let report = report(scenario, &arena, survivor);
    info!(
        scenario = %report.scenario,
        ticks = report.ticks,
        winner = report.winner.as_deref().unwrap_or("none"),
        condition = %report.win_condition,
        "Match finished"
    );
    Ok(MatchOutcome { report, log })
}

fn report(scenario: &Scenario, arena: &Arena, survivor: Option<PlayerId>) -> MatchReport {
    let players: Vec<PlayerReport> = PLAYER_IDS
        .iter()
        .zip(&scenario.players)
        .map(|(&player, setup)| PlayerReport {
            player,
            name: setup.name.clone(),
            units_alive: arena.alive_units(player),
            installations: arena.installations_owned(player),
            stats: arena.stats(player).cloned().unwrap_or_default(),
        })
        .collect();

    let (winner, win_condition) = if let Some(player) = survivor {
        (players.iter().find(|p| p.player == player), "elimination")
    } else {
        match players[0].units_alive.cmp(&players[1].units_alive) {
            std::cmp::Ordering::Greater => (players.first(), "units_remaining"),
            std::cmp::Ordering::Less => (players.get(1), "units_remaining"),
            std::cmp::Ordering::Equal => (None, "draw"),
        }
    };

    MatchReport {
        scenario: scenario.name.clone(),
        ticks: arena.tick(),
        winner: winner.map(|p| p.name.clone()),
        win_condition: win_condition.to_string(),
        players,
    }
}

/// Replay `scenario` and compare the emitted commands with `recorded`.
pub fn verify_log(
    scenario: &Scenario,
    recorded: &CommandLog,
    max_ticks: Option<Tick>,
) -> Result<Verification, RunnerError> {
    let outcome = run_match(
        scenario,
        &MatchOptions {
            max_ticks,
            record: true,
        },
    )?;
    let replayed = outcome.log.unwrap_or_else(|| CommandLog::new(scenario.name.clone()));
    let first_divergence = recorded
        .entries
        .iter()
        .zip(&replayed.entries)
        .position(|(a, b)| a != b)
        .or_else(|| {
            (recorded.len() != replayed.len()).then(|| recorded.len().min(replayed.len()))
        });
    Ok(Verification {
        recorded: recorded.len(),
        replayed: replayed.len(),
        first_divergence,
    })
}
