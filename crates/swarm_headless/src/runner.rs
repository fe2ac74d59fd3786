//! JSON-lines session driving one controller for an external simulator.

use std::io::{BufRead, Write};

use swarm_core::config::TacticsConfig;
use swarm_core::constants::GameConstants;
use swarm_core::controller::TacticalController;
use tracing::{debug, info, warn};

use crate::error::RunnerError;
use crate::protocol::{Request, Response};

/// Counters of a finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Tick requests answered.
    pub ticks: u64,
    /// Ticks answered with a command.
    pub commands: u64,
    /// Lines that could not be parsed.
    pub errors: u64,
}

/// Headless runner for one host-controlled player.
#[derive(Debug)]
pub struct HeadlessRunner {
    controller: TacticalController,
    constants: GameConstants,
}

impl HeadlessRunner {
    /// Create a runner; `config` is validated.
    pub fn new(config: TacticsConfig, constants: GameConstants) -> Result<Self, RunnerError> {
        Ok(Self {
            controller: TacticalController::new(config)?,
            constants,
        })
    }

    /// The controller being driven.
    #[must_use]
    pub fn controller(&self) -> &TacticalController {
        &self.controller
    }

    /// Answer one input line. `None` once the host asked to quit.
    pub fn handle_line(&mut self, line: &str) -> Option<Response> {
        let request = match Request::from_json(line) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Unreadable request");
                return Some(Response::error(e.to_string()));
            }
        };
        match request {
            Request::Tick { world, constants } => {
                if let Some(constants) = constants {
                    debug!(tick = world.tick, "Game constants replaced");
                    self.constants = constants;
                }
                let command = self.controller.decide(&world, &self.constants);
                Some(Response::Command {
                    tick: world.tick,
                    command,
                })
            }
            Request::Quit => None,
        }
    }

    /// Serve requests from `input` until `quit` or end of input.
    ///
    /// Blank lines are skipped.
    pub fn serve<R: BufRead, W: Write>(
        &mut self,
        input: R,
        mut output: W,
    ) -> Result<SessionSummary, RunnerError> {
        let mut summary = SessionSummary::default();
        output.write_all(Response::ready().to_json_line().as_bytes())?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let Some(response) = self.handle_line(&line) else {
                break;
            };
            match &response {
                Response::Command { command, .. } => {
                    summary.ticks += 1;
                    if command.is_some() {
                        summary.commands += 1;
                    }
                }
                Response::Error { .. } => summary.errors += 1,
                Response::Ready { .. } | Response::Bye => {}
            }
            output.write_all(response.to_json_line().as_bytes())?;
            output.flush()?;
        }

        output.write_all(Response::Bye.to_json_line().as_bytes())?;
        output.flush()?;
        info!(
            ticks = summary.ticks,
            commands = summary.commands,
            errors = summary.errors,
            "Session finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_core::command::Command;
    use swarm_core::world::WorldSnapshot;
    use swarm_test_utils::fixtures::{quiet_tick, SnapshotBuilder};
    use swarm_core::math::Vec2;
    use swarm_core::units::UnitCategory;

    fn runner() -> HeadlessRunner {
        HeadlessRunner::new(TacticsConfig::default(), GameConstants::default()).unwrap()
    }

    fn tick_line(world: &WorldSnapshot) -> String {
        serde_json::to_string(&Request::Tick {
            world: Box::new(world.clone()),
            constants: None,
        })
        .unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = TacticsConfig {
            latency_ticks: 0,
            ..TacticsConfig::default()
        };
        assert!(matches!(
            HeadlessRunner::new(config, GameConstants::default()),
            Err(RunnerError::Core(_))
        ));
    }

    #[test]
    fn test_quiet_tick_answers_null() {
        let mut runner = runner();
        let response = runner.handle_line(&tick_line(&quiet_tick(0))).unwrap();
        assert_eq!(
            response,
            Response::Command {
                tick: 0,
                command: None
            }
        );
    }

    #[test]
    fn test_bad_line_answers_error() {
        let mut runner = runner();
        assert!(matches!(
            runner.handle_line("{\"type\":\"tock\"}"),
            Some(Response::Error { .. })
        ));
    }

    #[test]
    fn test_session_transcript() {
        let opening = SnapshotBuilder::new(0)
            .own_block(UnitCategory::GroundHeavy, Vec2::new(100.0, 100.0), 10, 4.0, None)
            .enemy(UnitCategory::GroundHeavy, Vec2::new(900.0, 900.0))
            .build();
        let input = format!(
            "{}\n\ngarbage\n{}\n{{\"type\":\"quit\"}}\n{}\n",
            tick_line(&opening),
            tick_line(&quiet_tick(1)),
            tick_line(&quiet_tick(2)),
        );
        let mut output = Vec::new();
        let summary = runner().serve(input.as_bytes(), &mut output).unwrap();

        assert_eq!(summary.ticks, 2);
        assert_eq!(summary.errors, 1);
        assert!(summary.commands >= 1);

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<Response> = text.lines().map(|l| Response::from_json(l).unwrap()).collect();
        assert_eq!(lines.first(), Some(&Response::ready()));
        assert_eq!(lines.last(), Some(&Response::Bye));
        assert!(matches!(
            &lines[1],
            Response::Command {
                tick: 0,
                command: Some(Command::SelectRect { .. })
            }
        ));
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_end_of_input_still_says_bye() {
        let mut output = Vec::new();
        let summary = runner().serve(&b""[..], &mut output).unwrap();
        assert_eq!(summary, SessionSummary::default());
        assert!(String::from_utf8(output).unwrap().ends_with("{\"type\":\"bye\"}\n"));
    }
}
