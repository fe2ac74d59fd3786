//! Per-tick world snapshot handed to the controller by the host.
//!
//! Units arrive as deltas: full records for newly seen units and compact
//! updates for the rest. A health of 0 in an update means the unit is gone
//! (destroyed or out of sight).

use serde::{Deserialize, Serialize};

use crate::math::Vec2;
use crate::units::{GroupTag, InstallationId, PlayerId, UnitCategory, UnitId};

/// Game tick index.
pub type Tick = u64;

/// Full record of a unit seen for the first time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Unit id.
    pub id: UnitId,
    /// Owning player.
    pub owner: PlayerId,
    /// Unit category.
    pub category: UnitCategory,
    /// Current position.
    pub position: Vec2,
    /// Current durability.
    pub health: u32,
    /// Maximum durability.
    pub max_health: u32,
    /// Group tag, own units only.
    #[serde(default)]
    pub group: Option<GroupTag>,
}

/// Change report for an already known unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitUpdate {
    /// Unit id.
    pub id: UnitId,
    /// Current position.
    pub position: Vec2,
    /// Current durability; 0 removes the unit.
    pub health: u32,
    /// Group tag, own units only.
    #[serde(default)]
    pub group: Option<GroupTag>,
}

/// Kind of a static installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallationKind {
    /// Shortens the owner's strike cooldown.
    ControlCenter,
    /// Produces units.
    Factory,
}

/// A capturable installation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installation {
    /// Installation id.
    pub id: InstallationId,
    /// Current owner, `None` while neutral.
    #[serde(default)]
    pub owner: Option<PlayerId>,
    /// Installation kind.
    pub kind: InstallationKind,
    /// Top-left corner of the footprint.
    pub top_left: Vec2,
    /// Category being produced, factories only.
    #[serde(default)]
    pub production: Option<UnitCategory>,
}

impl Installation {
    /// Center of a square footprint of side `size`.
    #[must_use]
    pub fn center(&self, size: f64) -> Vec2 {
        self.top_left + Vec2::new(size / 2.0, size / 2.0)
    }
}

/// Opponent strike announced by the host before detonation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikeAnnouncement {
    /// Impact point.
    pub point: Vec2,
    /// Unit guiding the strike.
    pub caster: UnitId,
}

/// Cooldowns and strike status of one player.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerState {
    /// Player id.
    pub id: PlayerId,
    /// Ticks until the player may act again.
    #[serde(default)]
    pub remaining_action_cooldown: u32,
    /// Ticks until the player may launch another strike.
    #[serde(default)]
    pub remaining_strike_cooldown: u32,
    /// Pending strike, if one has been launched and not yet detonated.
    #[serde(default)]
    pub next_strike: Option<StrikeAnnouncement>,
}

/// Terrain of a cell. Affects ground unit vision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    /// No modifier.
    #[default]
    Plain,
    /// Swamp.
    Swamp,
    /// Forest.
    Forest,
}

/// Weather of a cell. Affects aircraft vision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    /// No modifier.
    #[default]
    Clear,
    /// Cloud cover.
    Cloud,
    /// Rain.
    Rain,
}

/// Row-major grid of per-cell values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellGrid<T> {
    /// Number of cells along x.
    pub columns: usize,
    /// Number of cells along y.
    pub rows: usize,
    /// `rows × columns` values, row by row.
    pub cells: Vec<T>,
}

impl<T: Copy + Default> CellGrid<T> {
    /// Grid filled with one value.
    #[must_use]
    pub fn filled(columns: usize, rows: usize, value: T) -> Self {
        Self {
            columns,
            rows,
            cells: vec![value; columns * rows],
        }
    }

    /// Value at a cell, default when out of range.
    #[must_use]
    pub fn get(&self, column: usize, row: usize) -> T {
        if column >= self.columns || row >= self.rows {
            return T::default();
        }
        self.cells
            .get(row * self.columns + column)
            .copied()
            .unwrap_or_default()
    }

    /// Overwrite one cell. Out-of-range writes are ignored.
    pub fn set(&mut self, column: usize, row: usize, value: T) {
        if column < self.columns && row < self.rows {
            if let Some(cell) = self.cells.get_mut(row * self.columns + column) {
                *cell = value;
            }
        }
    }

    /// Value of the cell containing `position`.
    #[must_use]
    pub fn at_position(&self, position: Vec2, cell_size: f64) -> T {
        if position.x < 0.0 || position.y < 0.0 || cell_size <= 0.0 {
            return T::default();
        }
        self.get(
            (position.x / cell_size) as usize,
            (position.y / cell_size) as usize,
        )
    }
}

/// Everything the host reports for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Tick index.
    pub tick: Tick,
    /// Arena width.
    pub width: f64,
    /// Arena height.
    pub height: f64,
    /// The controlled player.
    pub me: PlayerState,
    /// The opposing player.
    pub opponent: PlayerState,
    /// Units seen for the first time this tick.
    #[serde(default)]
    pub new_units: Vec<UnitSnapshot>,
    /// Changes to known units.
    #[serde(default)]
    pub unit_updates: Vec<UnitUpdate>,
    /// All installations.
    #[serde(default)]
    pub installations: Vec<Installation>,
    /// Terrain grid, usually only on the first tick.
    #[serde(default)]
    pub terrain: Option<CellGrid<Terrain>>,
    /// Weather grid, usually only on the first tick.
    #[serde(default)]
    pub weather: Option<CellGrid<Weather>>,
}

impl WorldSnapshot {
    /// Empty snapshot of a square arena.
    #[must_use]
    pub fn empty(tick: Tick, size: f64, me: PlayerId, opponent: PlayerId) -> Self {
        Self {
            tick,
            width: size,
            height: size,
            me: PlayerState {
                id: me,
                ..Default::default()
            },
            opponent: PlayerState {
                id: opponent,
                ..Default::default()
            },
            new_units: Vec::new(),
            unit_updates: Vec::new(),
            installations: Vec::new(),
            terrain: None,
            weather: None,
        }
    }
}
