//! # Swarm Core
//!
//! Tick-driven tactical controller for a swarm of ground and aerial units.
//!
//! Each tick the host hands over a [`world::WorldSnapshot`]; the controller
//! answers with at most one [`command::Command`]. This crate contains only
//! decision logic:
//! - No rendering
//! - No network IO
//! - No randomness
//! - Ordered maps only, so decisions are reproducible
//!
//! ## Crate Structure
//!
//! - [`math`], [`geometry`] - vector arithmetic and segment/circle tests
//! - [`entity_view`] - stable unit cache built from snapshots
//! - [`groups`] - maneuver groups and their settle status
//! - [`formation`] - opening formation phases
//! - [`movement`] - collision-aware displacement search
//! - [`engagement`] - per-group maneuver choice
//! - [`strike`] - area strike targeting and evasion
//! - [`production`] - factory switching and releases
//! - [`action_queue`] - two-class pending command queue
//! - [`controller`] - the per-tick loop

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod action_queue;
pub mod command;
pub mod config;
pub mod constants;
pub mod controller;
pub mod engagement;
pub mod entity_view;
pub mod error;
pub mod formation;
pub mod geometry;
pub mod groups;
pub mod math;
pub mod movement;
pub mod production;
pub mod replay;
pub mod strike;
pub mod units;
pub mod visibility;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action_queue::{ActionQueue, Priority, Step};
    pub use crate::command::{Command, PendingCommand, Rect, Selection};
    pub use crate::config::TacticsConfig;
    pub use crate::constants::{CategoryStats, GameConstants, StrikeConstants, VisionFactors};
    pub use crate::controller::TacticalController;
    pub use crate::entity_view::{EntityView, Unit};
    pub use crate::error::{Result, TacticsError};
    pub use crate::formation::FormationPhase;
    pub use crate::groups::{Group, GroupRegistry};
    pub use crate::math::Vec2;
    pub use crate::replay::{CommandLog, LoggedCommand};
    pub use crate::units::{Domain, GroupTag, InstallationId, PlayerId, UnitCategory, UnitId};
    pub use crate::world::{
        CellGrid, Installation, InstallationKind, PlayerState, StrikeAnnouncement, Terrain, Tick,
        UnitSnapshot, UnitUpdate, WorldSnapshot,
    };
}
