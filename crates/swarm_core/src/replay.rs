//! Command log for recording the commands a match produced.
//!
//! A log stores the scenario name and every emitted command with the tick and
//! player it belongs to. Replaying a log against the same scenario reproduces
//! the match, since the controller is deterministic.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::command::Command;
use crate::error::{Result, TacticsError};
use crate::units::PlayerId;
use crate::world::Tick;

/// Log file format version.
pub const LOG_VERSION: u32 = 1;

/// A single emitted command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedCommand {
    /// Tick the command was emitted on.
    pub tick: Tick,
    /// Player that emitted it.
    pub player: PlayerId,
    /// The command.
    pub command: Command,
}

/// Ordered record of a match's commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandLog {
    /// Format version.
    pub version: u32,
    /// Scenario name.
    pub scenario: String,
    /// Entries in emission order.
    pub entries: Vec<LoggedCommand>,
}

impl CommandLog {
    /// Empty log for a scenario.
    #[must_use]
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            version: LOG_VERSION,
            scenario: scenario.into(),
            entries: Vec::new(),
        }
    }

    /// Append a command.
    pub fn record(&mut self, tick: Tick, player: PlayerId, command: Command) {
        self.entries.push(LoggedCommand {
            tick,
            player,
            command,
        });
    }

    /// Commands emitted on `tick`.
    #[must_use]
    pub fn at_tick(&self, tick: Tick) -> Vec<&LoggedCommand> {
        self.entries.iter().filter(|e| e.tick == tick).collect()
    }

    /// Commands emitted by `player`.
    pub fn by_player(&self, player: PlayerId) -> impl Iterator<Item = &LoggedCommand> {
        self.entries.iter().filter(move |e| e.player == player)
    }

    /// Number of recorded commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| TacticsError::CommandLog(format!("Failed to serialize log: {e}")))
    }

    /// Decode and check the format version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let log: Self = bincode::deserialize(bytes)
            .map_err(|e| TacticsError::CommandLog(format!("Failed to deserialize log: {e}")))?;
        if log.version != LOG_VERSION {
            return Err(TacticsError::LogVersionMismatch {
                expected: LOG_VERSION,
                found: log.version,
            });
        }
        Ok(log)
    }

    /// Save to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes).map_err(|e| {
            TacticsError::CommandLog(format!(
                "Failed to write '{}': {e}",
                path.as_ref().display()
            ))
        })
    }

    /// Load from a file.
    ///
    /// # Errors
    /// Returns an error if reading or decoding fails, or the log was written
    /// by another format version.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| {
            TacticsError::CommandLog(format!(
                "Failed to read '{}': {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_bytes(&bytes)
    }
}
