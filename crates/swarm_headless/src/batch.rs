//! Batch match runner.
//!
//! Runs every scenario file of a directory in parallel using rayon and
//! collects the match reports.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::RunnerError;
use crate::game_runner::{run_match, MatchOptions, MatchReport};
use crate::scenario::Scenario;

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Directory searched for `*.ron` scenarios
    pub scenarios_dir: PathBuf,
    /// Worker threads (0 = use rayon default)
    pub parallel: usize,
    /// Overrides every scenario's tick limit
    pub max_ticks: Option<u64>,
}

impl BatchConfig {
    /// Create config for a scenario directory
    pub fn new(scenarios_dir: impl Into<PathBuf>) -> Self {
        Self {
            scenarios_dir: scenarios_dir.into(),
            parallel: 0,
            max_ticks: None,
        }
    }

    /// Set worker threads
    #[must_use]
    pub fn with_parallel(mut self, threads: usize) -> Self {
        self.parallel = threads;
        self
    }

    /// Set tick limit
    #[must_use]
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }
}

/// Error during batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Scenario file
    pub file: String,
    /// Error message
    pub message: String,
}

/// One scenario's report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// Scenario file
    pub file: String,
    /// Match report
    pub report: MatchReport,
}

/// Aggregate over every finished match
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches finished
    pub total: u32,
    /// Wins per player name
    pub wins: BTreeMap<String, u32>,
    /// Matches without a winner
    pub draws: u32,
    /// Mean match length
    pub average_ticks: f64,
}

impl BatchSummary {
    /// Summarize a set of reports
    #[must_use]
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a MatchReport>) -> Self {
        let mut summary = Self::default();
        let mut ticks = 0u64;
        for report in reports {
            summary.total += 1;
            ticks += report.ticks;
            match &report.winner {
                Some(name) => *summary.wins.entry(name.clone()).or_insert(0) += 1,
                None => summary.draws += 1,
            }
        }
        if summary.total > 0 {
            summary.average_ticks = ticks as f64 / f64::from(summary.total);
        }
        summary
    }
}

/// Results from a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Reports in file name order
    pub matches: Vec<BatchEntry>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> Result<(), RunnerError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> Result<Self, RunnerError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Scenario files of `dir`, sorted by name.
pub fn collect_scenarios(dir: &Path) -> Result<Vec<PathBuf>, RunnerError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "ron") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn run_file(path: &Path, options: &MatchOptions) -> Result<MatchReport, RunnerError> {
    let scenario = Scenario::load(path)?;
    Ok(run_match(&scenario, options)?.report)
}

/// Run a batch of matches
pub fn run_batch(config: BatchConfig) -> Result<BatchResults, RunnerError> {
    let start = Instant::now();
    let files = collect_scenarios(&config.scenarios_dir)?;
    info!(
        dir = %config.scenarios_dir.display(),
        scenarios = files.len(),
        parallel = config.parallel,
        "Starting batch run"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.parallel)
        .build()
        .map_err(|e| RunnerError::Io(std::io::Error::other(e)))?;

    let options = MatchOptions {
        max_ticks: config.max_ticks,
        record: false,
    };
    let completed = AtomicU32::new(0);
    let results: Vec<(String, Result<MatchReport, RunnerError>)> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let result = run_file(path, &options);
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(done, total = files.len(), file = %path.display(), "Progress");
                (file_name(path), result)
            })
            .collect()
    });

    let mut matches = Vec::new();
    let mut errors = Vec::new();
    for (file, result) in results {
        match result {
            Ok(report) => matches.push(BatchEntry { file, report }),
            Err(e) => {
                warn!(file = %file, error = %e, "Scenario failed");
                errors.push(BatchError {
                    file,
                    message: e.to_string(),
                });
            }
        }
    }

    let summary = BatchSummary::from_reports(matches.iter().map(|m| &m.report));
    let duration_seconds = start.elapsed().as_secs_f64();
    info!(
        matches = matches.len(),
        errors = errors.len(),
        duration_seconds,
        "Batch complete"
    );

    Ok(BatchResults {
        config,
        matches,
        summary,
        duration_seconds,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUEL: &str = r#"(
        name: "duel",
        width: 512.0,
        height: 512.0,
        max_ticks: 30,
        players: [
            (name: "a", units: [(category: ground_heavy, x: 20.0, y: 20.0, count: 6)]),
            (name: "b", units: [(category: ground_heavy, x: 400.0, y: 400.0, count: 3)]),
        ],
    )"#;

    fn scenario_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_duel.ron"), DUEL).unwrap();
        std::fs::write(dir.path().join("a_duel.ron"), DUEL).unwrap();
        std::fs::write(dir.path().join("broken.ron"), "(name: ").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        dir
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new("/tmp/scenarios")
            .with_parallel(3)
            .with_max_ticks(100);
        assert_eq!(config.scenarios_dir, PathBuf::from("/tmp/scenarios"));
        assert_eq!(config.parallel, 3);
        assert_eq!(config.max_ticks, Some(100));
    }

    #[test]
    fn test_collect_scenarios_sorted() {
        let dir = scenario_dir();
        let names: Vec<String> = collect_scenarios(dir.path())
            .unwrap()
            .iter()
            .map(|p| file_name(p))
            .collect();
        assert_eq!(names, vec!["a_duel.ron", "b_duel.ron", "broken.ron"]);
    }

    #[test]
    fn test_run_batch_small() {
        let dir = scenario_dir();
        let results = run_batch(BatchConfig::new(dir.path()).with_parallel(2)).unwrap();

        assert_eq!(results.matches.len(), 2);
        assert_eq!(results.matches[0].file, "a_duel.ron");
        assert_eq!(results.errors.len(), 1);
        assert_eq!(results.errors[0].file, "broken.ron");
        assert_eq!(results.summary.total, 2);
        assert_eq!(results.summary.wins.get("a"), Some(&2));
    }

    #[test]
    fn test_summary_counts_draws() {
        let report = |winner: Option<&str>, ticks| MatchReport {
            scenario: "s".to_string(),
            ticks,
            winner: winner.map(str::to_string),
            win_condition: String::new(),
            players: Vec::new(),
        };
        let reports = [report(Some("a"), 10), report(None, 30)];
        let summary = BatchSummary::from_reports(&reports);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.draws, 1);
        assert_eq!(summary.average_ticks, 20.0);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run_batch(BatchConfig::new(dir.path().join("none"))).is_err());
    }

    #[test]
    fn test_batch_results_save_load() {
        let dir = scenario_dir();
        let results = run_batch(BatchConfig::new(dir.path())).unwrap();

        let out = tempfile::tempdir().unwrap();
        let path = out.path().join("nested").join("results.json");
        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.matches, results.matches);
        assert_eq!(loaded.summary.total, 2);
    }
}
