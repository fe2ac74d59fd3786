//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the controller makes identical
//! decisions given identical snapshot streams.
//!
//! # Testing Strategy
//!
//! A recorded command log only replays if every decision is reproducible.
//! Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   The core keys every table by id in a `BTreeMap`.
//!
//! - **System randomness**: the core has none; ties are broken by tag or id.
//!
//! - **Float formatting**: traces are hashed from the `Debug` form of each
//!   command, which prints the shortest exact representation of every `f64`.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: a single decision from a fixture snapshot
//! 2. **Property tests**: random layouts still produce identical traces
//! 3. **Parallel tests**: the same script decided on N threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use swarm_core::command::Command;
use swarm_core::config::TacticsConfig;
use swarm_core::constants::GameConstants;
use swarm_core::controller::TacticalController;
use swarm_core::world::WorldSnapshot;

/// Commands a controller emitted, one slot per tick.
pub type DecisionTrace = Vec<Option<Command>>;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks decided.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic controller).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Controller is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a stepped state multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one tick
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Feed `script` to a fresh controller and collect its decisions.
///
/// # Panics
///
/// Panics if `config` is invalid.
#[must_use]
pub fn decision_trace(
    config: &TacticsConfig,
    constants: &GameConstants,
    script: &[WorldSnapshot],
) -> DecisionTrace {
    let mut controller =
        TacticalController::new(config.clone()).expect("fixture config must be valid");
    script
        .iter()
        .map(|world| controller.decide(world, constants))
        .collect()
}

/// Hash of a decision trace.
#[must_use]
pub fn trace_hash(trace: &[Option<Command>]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for decision in trace {
        format!("{decision:?}").hash(&mut hasher);
    }
    hasher.finish()
}

/// Decide `script` `runs` times with fresh controllers and compare traces.
#[must_use]
pub fn verify_controller_determinism(
    runs: usize,
    config: &TacticsConfig,
    constants: &GameConstants,
    script: &[WorldSnapshot],
) -> DeterminismResult {
    let hashes: Vec<u64> = (0..runs)
        .map(|_| trace_hash(&decision_trace(config, constants, script)))
        .collect();

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: script.len() as u64,
    }
}

/// Decide the same script on `threads` scoped threads and collect trace hashes.
///
/// # Panics
///
/// Panics if a worker thread panics.
#[must_use]
pub fn run_parallel_controllers(
    threads: usize,
    config: &TacticsConfig,
    constants: &GameConstants,
    script: &[WorldSnapshot],
) -> DeterminismResult {
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| s.spawn(|| trace_hash(&decision_trace(config, constants, script))))
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("controller thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: script.len() as u64,
    }
}

/// First tick at which two traces differ.
///
/// Traces of different lengths diverge at the end of the shorter one.
#[must_use]
pub fn find_first_divergence(a: &[Option<Command>], b: &[Option<Command>]) -> Option<usize> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())))
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
