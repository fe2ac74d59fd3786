//! JSON-lines protocol for an external simulator.
//!
//! The host writes one request per line on stdin and reads one response per
//! line on stdout:
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1"}`
//! 2. Host sends a `tick` request with the world snapshot of that tick
//! 3. Runner answers with the command to apply, or `null`
//! 4. Host sends `quit`, runner answers `bye` and exits
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1"}
//! -> {"type":"tick","world":{"tick":0,"width":1024.0,...},"constants":{...}}
//! <- {"type":"command","tick":0,"command":{"select_rect":{...}}}
//! -> {"type":"tick","world":{"tick":1,...}}
//! <- {"type":"command","tick":1,"command":null}
//! -> {"type":"quit"}
//! <- {"type":"bye"}
//! ```
//!
//! Constants sent with a tick replace the ones in use for that tick and
//! every later one.

use serde::{Deserialize, Serialize};
use swarm_core::command::Command;
use swarm_core::constants::GameConstants;
use swarm_core::world::{Tick, WorldSnapshot};

use crate::error::ProtocolError;

/// Protocol version announced in [`Response::Ready`].
pub const PROTOCOL_VERSION: &str = "1";

// ============================================================================
// Input Requests (Host -> Runner)
// ============================================================================

/// Requests the host sends to the runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Decide one tick.
    Tick {
        /// Snapshot of the tick.
        world: Box<WorldSnapshot>,
        /// Replacement game constants.
        #[serde(default)]
        constants: Option<GameConstants>,
    },
    /// End the session.
    Quit,
}

impl Request {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(json.trim())?)
    }

    /// Get request name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Quit => "quit",
        }
    }
}

// ============================================================================
// Output Responses (Runner -> Host)
// ============================================================================

/// Responses sent from the runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept requests.
    Ready {
        /// Protocol version.
        version: String,
    },
    /// Decision for one tick.
    Command {
        /// Tick the decision belongs to.
        tick: Tick,
        /// Command to apply, `null` to do nothing.
        command: Option<Command>,
    },
    /// A request could not be processed.
    Error {
        /// Human-readable reason.
        message: String,
    },
    /// Goodbye message before shutdown.
    Bye,
}

impl Response {
    /// Create a ready response.
    #[must_use]
    pub fn ready() -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Serialize to JSON line (with newline).
    #[must_use]
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }

    /// Parse a response line, as the host side does.
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(json.trim())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_core::units::UnitCategory;

    #[test]
    fn test_parse_tick_request() {
        let json = r#"{"type":"tick","world":{"tick":7,"width":512.0,"height":512.0,
            "me":{"id":1},"opponent":{"id":2}}}"#;
        let request = Request::from_json(json).unwrap();
        let Request::Tick { world, constants } = request else {
            panic!("expected a tick request");
        };
        assert_eq!(world.tick, 7);
        assert_eq!(world.me.id, 1);
        assert!(world.new_units.is_empty());
        assert!(constants.is_none());
    }

    #[test]
    fn test_parse_quit() {
        let request = Request::from_json("{\"type\":\"quit\"}\n").unwrap();
        assert_eq!(request, Request::Quit);
        assert_eq!(request.name(), "quit");
    }

    #[test]
    fn test_unknown_request_is_an_error() {
        assert!(Request::from_json(r#"{"type":"spawn"}"#).is_err());
        assert!(Request::from_json("not json").is_err());
    }

    #[test]
    fn test_serialize_command_response() {
        let response = Response::Command {
            tick: 3,
            command: Some(Command::SelectRect {
                left: 0.0,
                top: 0.0,
                right: 10.0,
                bottom: 10.0,
                category: Some(UnitCategory::GroundHeavy),
            }),
        };
        let line = response.to_json_line();
        assert!(line.ends_with('\n'));
        assert!(line.contains(r#""type":"command""#));
        assert!(line.contains(r#""tick":3"#));
        assert_eq!(Response::from_json(&line).unwrap(), response);
    }

    #[test]
    fn test_idle_tick_serializes_null() {
        let line = Response::Command {
            tick: 9,
            command: None,
        }
        .to_json_line();
        assert!(line.contains(r#""command":null"#));
    }

    #[test]
    fn test_ready_carries_version() {
        let line = Response::ready().to_json_line();
        assert_eq!(line, "{\"type\":\"ready\",\"version\":\"1\"}\n");
    }
}
