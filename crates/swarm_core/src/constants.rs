//! Static game constants supplied by the host.
//!
//! Defaults reproduce the host game's published values; a match can override
//! them from a RON file.
//!
//! # Example RON
//!
//! ```ron
//! GameConstants(
//!     strike: StrikeConstants(radius: 50.0, base_cooldown: 1200, cooldown_decrease_per_control_center: 60, delay: 30),
//!     cell_size: 32.0,
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{parse_ron, read_ron};
use crate::error::Result;
use crate::units::UnitCategory;
use crate::world::{Terrain, Weather};

/// Per-category unit statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    /// Maximum speed in arena units per tick.
    pub speed: f64,
    /// Base vision range.
    pub vision_range: f64,
    /// Attack range against ground targets.
    pub ground_attack_range: f64,
    /// Attack range against aerial targets.
    pub aerial_attack_range: f64,
    /// Damage per attack against ground targets.
    pub ground_damage: f64,
    /// Damage per attack against aerial targets.
    pub aerial_damage: f64,
    /// Maximum durability.
    pub max_durability: u32,
}

impl CategoryStats {
    /// Attack range against a target category.
    #[must_use]
    pub fn attack_range_against(&self, target: UnitCategory) -> f64 {
        if target.is_aerial() {
            self.aerial_attack_range
        } else {
            self.ground_attack_range
        }
    }

    /// Damage per attack against a target category.
    #[must_use]
    pub fn damage_against(&self, target: UnitCategory) -> f64 {
        if target.is_aerial() {
            self.aerial_damage
        } else {
            self.ground_damage
        }
    }
}

/// Area-strike timing and radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikeConstants {
    /// Blast radius.
    pub radius: f64,
    /// Cooldown after launching a strike with no control centers owned.
    pub base_cooldown: u32,
    /// Cooldown reduction per owned control center.
    pub cooldown_decrease_per_control_center: u32,
    /// Ticks between announcing and detonating a strike.
    pub delay: u32,
}

impl Default for StrikeConstants {
    fn default() -> Self {
        Self {
            radius: 50.0,
            base_cooldown: 1200,
            cooldown_decrease_per_control_center: 60,
            delay: 30,
        }
    }
}

impl StrikeConstants {
    /// Cooldown applied after a launch by a player owning `control_centers`.
    #[must_use]
    pub fn cooldown_for(&self, control_centers: usize) -> u32 {
        let decrease = self
            .cooldown_decrease_per_control_center
            .saturating_mul(control_centers as u32);
        self.base_cooldown.saturating_sub(decrease)
    }
}

/// Vision multipliers by cell terrain (ground units) or weather (aircraft).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisionFactors {
    /// Plain terrain.
    pub plain: f64,
    /// Swamp terrain.
    pub swamp: f64,
    /// Forest terrain.
    pub forest: f64,
    /// Clear weather.
    pub clear: f64,
    /// Cloud weather.
    pub cloud: f64,
    /// Rain weather.
    pub rain: f64,
}

impl Default for VisionFactors {
    fn default() -> Self {
        Self {
            plain: 1.0,
            swamp: 1.0,
            forest: 0.8,
            clear: 1.0,
            cloud: 0.8,
            rain: 0.6,
        }
    }
}

impl VisionFactors {
    /// Multiplier for a ground unit standing on `terrain`.
    #[must_use]
    pub const fn terrain(&self, terrain: Terrain) -> f64 {
        match terrain {
            Terrain::Plain => self.plain,
            Terrain::Swamp => self.swamp,
            Terrain::Forest => self.forest,
        }
    }

    /// Multiplier for an aircraft flying through `weather`.
    #[must_use]
    pub const fn weather(&self, weather: Weather) -> f64 {
        match weather {
            Weather::Clear => self.clear,
            Weather::Cloud => self.cloud,
            Weather::Rain => self.rain,
        }
    }
}

/// All static constants of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConstants {
    /// Heavy tank stats.
    pub ground_heavy: CategoryStats,
    /// Light armor stats.
    pub ground_light: CategoryStats,
    /// Support vehicle stats.
    pub ground_support: CategoryStats,
    /// Fighter stats.
    pub air_interceptor: CategoryStats,
    /// Helicopter stats.
    pub air_transport: CategoryStats,
    /// Area-strike constants.
    pub strike: StrikeConstants,
    /// Terrain and weather vision factors.
    pub vision: VisionFactors,
    /// Side length of one terrain/weather cell.
    pub cell_size: f64,
    /// Side length of an installation footprint.
    pub installation_size: f64,
}

impl Default for GameConstants {
    fn default() -> Self {
        Self {
            ground_heavy: CategoryStats {
                speed: 0.4,
                vision_range: 80.0,
                ground_attack_range: 20.0,
                aerial_attack_range: 18.0,
                ground_damage: 100.0,
                aerial_damage: 60.0,
                max_durability: 100,
            },
            ground_light: CategoryStats {
                speed: 0.4,
                vision_range: 80.0,
                ground_attack_range: 18.0,
                aerial_attack_range: 20.0,
                ground_damage: 90.0,
                aerial_damage: 80.0,
                max_durability: 100,
            },
            ground_support: CategoryStats {
                speed: 0.4,
                vision_range: 60.0,
                ground_attack_range: 0.0,
                aerial_attack_range: 0.0,
                ground_damage: 0.0,
                aerial_damage: 0.0,
                max_durability: 100,
            },
            air_interceptor: CategoryStats {
                speed: 1.2,
                vision_range: 120.0,
                ground_attack_range: 0.0,
                aerial_attack_range: 20.0,
                ground_damage: 0.0,
                aerial_damage: 100.0,
                max_durability: 100,
            },
            air_transport: CategoryStats {
                speed: 0.9,
                vision_range: 100.0,
                ground_attack_range: 20.0,
                aerial_attack_range: 18.0,
                ground_damage: 100.0,
                aerial_damage: 80.0,
                max_durability: 100,
            },
            strike: StrikeConstants::default(),
            vision: VisionFactors::default(),
            cell_size: 32.0,
            installation_size: 64.0,
        }
    }
}

impl GameConstants {
    /// Load constants from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        read_ron(path.as_ref())
    }

    /// Parse constants from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        parse_ron(ron, "<inline>")
    }

    /// Stats of a category.
    #[must_use]
    pub const fn stats(&self, category: UnitCategory) -> &CategoryStats {
        match category {
            UnitCategory::GroundHeavy => &self.ground_heavy,
            UnitCategory::GroundLight => &self.ground_light,
            UnitCategory::GroundSupport => &self.ground_support,
            UnitCategory::AirInterceptor => &self.air_interceptor,
            UnitCategory::AirTransport => &self.air_transport,
        }
    }

    /// Largest base vision range of any category.
    #[must_use]
    pub fn max_vision_range(&self) -> f64 {
        UnitCategory::ALL
            .iter()
            .map(|&c| self.stats(c).vision_range)
            .fold(0.0, f64::max)
    }
}
