//! Headless host wiring for the swarm tactical controller.
//!
//! This crate connects the decision core to something that produces world
//! snapshots and consumes commands:
//!
//! - **External simulator**: JSON lines on stdin/stdout, one tick per line
//! - **Mock arena**: two controllers play each other from a RON scenario
//! - **Batch runs**: a directory of scenarios played in parallel
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Tick requests carrying a world snapshot, or `quit`
//! - **stdout**: The command for each tick (JSON)
//! - **stderr**: Debug logs (human-readable)
//!
//! See [`protocol`] module for the full request/response format.
//!
//! # Example
//!
//! ```bash
//! # Serve an external simulator
//! some_simulator | cargo run -p swarm_headless -- play
//!
//! # Run a scenario
//! cargo run -p swarm_headless -- run --scenario scenarios/duel.ron
//!
//! # Verify a recorded match
//! cargo run -p swarm_headless -- verify --scenario scenarios/duel.ron --log duel.bin
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod arena;
pub mod batch;
pub mod error;
pub mod game_runner;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use arena::{Arena, CommandOutcome, SideStats};
pub use batch::{run_batch, BatchConfig, BatchResults};
pub use error::{ProtocolError, RunnerError};
pub use game_runner::{run_match, verify_log, MatchOptions, MatchOutcome, MatchReport};
pub use protocol::{Request, Response};
pub use runner::HeadlessRunner;
pub use scenario::Scenario;
