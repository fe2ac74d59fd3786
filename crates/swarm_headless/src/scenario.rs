//! Scenario loading and configuration.
//!
//! Scenarios define the starting layout of a mock-arena match: arena size,
//! each side's units, installations, terrain and weather patches, arena rules
//! and optional per-player controller configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use swarm_core::config::TacticsConfig;
use swarm_core::constants::GameConstants;
use swarm_core::units::UnitCategory;
use swarm_core::world::{InstallationKind, Terrain, Weather};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Layout is unusable.
    #[error("Invalid scenario layout: {0}")]
    InvalidLayout(String),
}

/// A block of identical units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// Category of every unit in the block.
    pub category: UnitCategory,
    /// Top-left unit position.
    pub x: f64,
    /// Top-left unit position.
    pub y: f64,
    /// Number of units.
    pub count: u32,
    /// Distance between neighbours; blocks are ten units wide.
    #[serde(default = "default_spacing")]
    pub spacing: f64,
}

fn default_spacing() -> f64 {
    6.0
}

impl UnitPlacement {
    /// Create a placement with default spacing.
    pub fn new(category: UnitCategory, x: f64, y: f64, count: u32) -> Self {
        Self {
            category,
            x,
            y,
            count,
            spacing: default_spacing(),
        }
    }

    /// Positions of every unit in the block.
    pub fn positions(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        (0..self.count).map(move |i| {
            (
                self.x + f64::from(i % 10) * self.spacing,
                self.y + f64::from(i / 10) * self.spacing,
            )
        })
    }
}

/// One side of the match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSetup {
    /// Display name.
    pub name: String,
    /// Starting units.
    pub units: Vec<UnitPlacement>,
    /// Controller configuration, defaults when absent.
    #[serde(default)]
    pub config: Option<TacticsConfig>,
}

/// An installation on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallationPlacement {
    /// Installation kind.
    pub kind: InstallationKind,
    /// Top-left corner.
    pub x: f64,
    /// Top-left corner.
    pub y: f64,
    /// Index into [`Scenario::players`] of the starting owner.
    #[serde(default)]
    pub owner: Option<usize>,
}

/// A rectangle of non-default terrain, in cell coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainPatch {
    /// First column.
    pub column: usize,
    /// First row.
    pub row: usize,
    /// Width in cells.
    pub columns: usize,
    /// Height in cells.
    pub rows: usize,
    /// Terrain of the patch.
    pub terrain: Terrain,
}

/// A rectangle of non-default weather, in cell coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherPatch {
    /// First column.
    pub column: usize,
    /// First row.
    pub row: usize,
    /// Width in cells.
    pub columns: usize,
    /// Height in cells.
    pub rows: usize,
    /// Weather of the patch.
    pub weather: Weather,
}

/// Host rules the mock arena applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaRules {
    /// Ticks a player must wait after each command.
    pub action_cooldown: u32,
    /// Ticks between two attacks of one unit.
    pub attack_interval: u64,
    /// Attack damage is divided by this before it is applied.
    pub damage_divisor: f64,
    /// Ticks of uncontested presence needed to capture an installation.
    pub capture_ticks: u32,
    /// Ticks between two units from a producing factory.
    pub production_interval: u64,
}

impl Default for ArenaRules {
    fn default() -> Self {
        Self {
            action_cooldown: 0,
            attack_interval: 60,
            damage_divisor: 10.0,
            capture_ticks: 100,
            production_interval: 60,
        }
    }
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Arena width.
    pub width: f64,
    /// Arena height.
    pub height: f64,
    /// Match length limit.
    pub max_ticks: u64,
    /// Exactly two players.
    pub players: Vec<PlayerSetup>,
    /// Installations.
    #[serde(default)]
    pub installations: Vec<InstallationPlacement>,
    /// Terrain patches over a plain map.
    #[serde(default)]
    pub terrain: Vec<TerrainPatch>,
    /// Weather patches over a clear sky.
    #[serde(default)]
    pub weather: Vec<WeatherPatch>,
    /// Arena rules.
    #[serde(default)]
    pub rules: ArenaRules,
    /// Game constants, defaults when absent.
    #[serde(default)]
    pub constants: Option<GameConstants>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check the layout can be played.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.players.len() != 2 {
            return Err(ScenarioError::InvalidLayout(format!(
                "expected 2 players, found {}",
                self.players.len()
            )));
        }
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(ScenarioError::InvalidLayout("arena must have a positive size".into()));
        }
        if self.max_ticks == 0 {
            return Err(ScenarioError::InvalidLayout("max_ticks must be positive".into()));
        }
        if self.rules.damage_divisor <= 0.0 || self.rules.attack_interval == 0 {
            return Err(ScenarioError::InvalidLayout(
                "attack interval and damage divisor must be positive".into(),
            ));
        }
        for player in &self.players {
            for (x, y) in player.units.iter().flat_map(UnitPlacement::positions) {
                if !(0.0..=self.width).contains(&x) || !(0.0..=self.height).contains(&y) {
                    return Err(ScenarioError::InvalidLayout(format!(
                        "unit of '{}' at ({x}, {y}) is outside the arena",
                        player.name
                    )));
                }
            }
        }
        if let Some(i) = self
            .installations
            .iter()
            .position(|i| i.owner.is_some_and(|o| o >= self.players.len()))
        {
            return Err(ScenarioError::InvalidLayout(format!(
                "installation {i} has an unknown owner"
            )));
        }
        Ok(())
    }

    /// Constants for the match.
    #[must_use]
    pub fn game_constants(&self) -> GameConstants {
        self.constants.clone().unwrap_or_default()
    }

    /// A mirrored 1v1 with every category, two factories and a forest belt.
    #[must_use]
    pub fn skirmish() -> Self {
        let side = |name: &str, x: f64, y: f64| PlayerSetup {
            name: name.to_string(),
            units: UnitCategory::ALL
                .into_iter()
                .enumerate()
                .map(|(i, category)| UnitPlacement::new(category, x, y + i as f64 * 40.0, 20))
                .collect(),
            config: None,
        };
        Self {
            name: "skirmish".to_string(),
            description: "Mirrored armies in opposite corners".to_string(),
            width: 1024.0,
            height: 1024.0,
            max_ticks: 4000,
            players: vec![side("north", 40.0, 40.0), side("south", 920.0, 780.0)],
            installations: vec![
                InstallationPlacement {
                    kind: InstallationKind::Factory,
                    x: 320.0,
                    y: 640.0,
                    owner: None,
                },
                InstallationPlacement {
                    kind: InstallationKind::Factory,
                    x: 640.0,
                    y: 320.0,
                    owner: None,
                },
                InstallationPlacement {
                    kind: InstallationKind::ControlCenter,
                    x: 480.0,
                    y: 480.0,
                    owner: None,
                },
            ],
            terrain: vec![TerrainPatch {
                column: 12,
                row: 0,
                columns: 2,
                rows: 32,
                terrain: Terrain::Forest,
            }],
            weather: vec![WeatherPatch {
                column: 0,
                row: 14,
                columns: 32,
                rows: 4,
                weather: Weather::Cloud,
            }],
            rules: ArenaRules::default(),
            constants: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"(
        name: "duel",
        width: 512.0,
        height: 512.0,
        max_ticks: 300,
        players: [
            (name: "a", units: [(category: ground_heavy, x: 20.0, y: 20.0, count: 12)]),
            (name: "b", units: [(category: air_transport, x: 400.0, y: 400.0, count: 5, spacing: 4.0)]),
        ],
        installations: [(kind: factory, x: 224.0, y: 224.0)],
        rules: (action_cooldown: 2),
    )"#;

    #[test]
    fn test_parse_small_scenario() {
        let scenario = Scenario::from_ron_str(SMALL).unwrap();
        assert_eq!(scenario.name, "duel");
        assert_eq!(scenario.players[1].units[0].spacing, 4.0);
        assert_eq!(scenario.players[0].units[0].spacing, 6.0);
        assert_eq!(scenario.rules.action_cooldown, 2);
        assert_eq!(scenario.rules.attack_interval, 60);
        assert!(scenario.constants.is_none());
    }

    #[test]
    fn test_block_wraps_after_ten() {
        let placement = UnitPlacement::new(UnitCategory::GroundLight, 0.0, 0.0, 12);
        let positions: Vec<_> = placement.positions().collect();
        assert_eq!(positions[9], (54.0, 0.0));
        assert_eq!(positions[10], (0.0, 6.0));
    }

    #[test]
    fn test_single_player_rejected() {
        let mut scenario = Scenario::skirmish();
        scenario.players.pop();
        assert!(matches!(scenario.validate(), Err(ScenarioError::InvalidLayout(_))));
    }

    #[test]
    fn test_unit_outside_arena_rejected() {
        let mut scenario = Scenario::skirmish();
        scenario.players[0].units[0].x = 2000.0;
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn test_builtin_skirmish_is_valid() {
        Scenario::skirmish().validate().unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Scenario::load(dir.path().join("nope.ron"));
        assert!(matches!(result, Err(ScenarioError::FileNotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duel.ron");
        std::fs::write(&path, SMALL).unwrap();
        assert_eq!(Scenario::load(&path).unwrap().max_ticks, 300);
    }
}
