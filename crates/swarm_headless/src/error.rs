//! Error types for the headless runner.

use swarm_core::error::TacticsError;
use thiserror::Error;

use crate::scenario::ScenarioError;

/// A protocol line could not be understood.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Invalid JSON or unknown request.
    #[error("Failed to parse request: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure of a session, match or batch.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// Controller construction, configuration or command log failure.
    #[error(transparent)]
    Core(#[from] TacticsError),
    /// Scenario could not be loaded.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// Reading input or writing output failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A report could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
