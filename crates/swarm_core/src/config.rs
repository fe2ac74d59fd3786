//! Tunable controller thresholds.
//!
//! Every numeric threshold the controller applies lives here so that matches
//! can be tuned from a RON file without rebuilding. Missing fields fall back
//! to the defaults below.

use std::f64::consts::PI;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TacticsError};
use crate::units::UnitCategory;

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TacticsConfig {
    /// Host command round-trip latency in ticks. Caps a single move at
    /// `latency_ticks × max_speed`.
    pub latency_ticks: u32,
    /// A unit is stable once its last change is more than this many ticks old.
    pub settle_ticks: u32,
    /// Angular step of the move sweep, in radians.
    pub angular_step: f64,
    /// Extra clearance between group bodies.
    pub safety_margin: f64,
    /// Subtracted from the effective vision range in visibility checks.
    pub vision_epsilon: f64,
    /// Distance from the arena border where move components are dropped.
    pub edge_margin: f64,
    /// Clearance between groups when aligning formations.
    pub formation_spacing: f64,
    /// Scale factor used to compress groups.
    pub compress_factor: f64,
    /// Clearance added to the strike radius when detecting threats.
    pub evasion_margin: f64,
    /// Scale factor that disperses a threatened group.
    pub evasion_scale_out: f64,
    /// Scale factor that regathers a group after the threat is gone.
    pub evasion_scale_in: f64,
    /// A strike target must hold strictly more enemies than this.
    pub strike_min_targets: usize,
    /// Health scale of the likely-destroyed estimate.
    pub strike_kill_health_scale: f64,
    /// Weight of likely-destroyed enemies in the strike score.
    pub strike_kill_weight: usize,
    /// Strike bucket cell size as a multiple of the largest vision range.
    pub strike_cell_factor: f64,
    /// Enemies within this distance of each other are summed as one chain.
    pub chain_distance: f64,
    /// Members below this fraction of max health count as damaged.
    pub damaged_health_fraction: f64,
    /// Share of damaged members that sends a group to resupply.
    pub resupply_damaged_share: f64,
    /// Cautious approach coefficient when the own strike is far from ready.
    pub cautious_far_coefficient: f64,
    /// Cautious approach coefficient otherwise.
    pub cautious_near_coefficient: f64,
    /// Own strike cooldown above which the far coefficient applies.
    pub cautious_cooldown_pivot: u32,
    /// Untagged units near a factory that trigger a group release.
    pub factory_release_count: usize,
    /// Radius around a factory center counted for a release.
    pub factory_release_radius: f64,
    /// Accepted production categories, preferred first.
    pub production_preference: Vec<UnitCategory>,
    /// Run the setup formation sequence before free maneuver.
    pub run_formation: bool,
    /// Avoid closing on enemies during capture and resupply moves.
    pub avoid_enemy_on_objectives: bool,
}

impl Default for TacticsConfig {
    fn default() -> Self {
        Self {
            latency_ticks: 130,
            settle_ticks: 5,
            angular_step: PI / 8.0,
            safety_margin: 6.0,
            vision_epsilon: 1.0,
            edge_margin: 10.0,
            formation_spacing: 10.0,
            compress_factor: 0.1,
            evasion_margin: 20.0,
            evasion_scale_out: 10.0,
            evasion_scale_in: 0.1,
            strike_min_targets: 5,
            strike_kill_health_scale: 99.0,
            strike_kill_weight: 2,
            strike_cell_factor: 2.0,
            chain_distance: 10.0,
            damaged_health_fraction: 0.7,
            resupply_damaged_share: 0.7,
            cautious_far_coefficient: 1.2,
            cautious_near_coefficient: 0.6,
            cautious_cooldown_pivot: 100,
            factory_release_count: 32,
            factory_release_radius: 50.0,
            production_preference: vec![UnitCategory::AirTransport, UnitCategory::GroundLight],
            run_formation: true,
            avoid_enemy_on_objectives: true,
        }
    }
}

impl TacticsConfig {
    /// Load and validate a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: Self = read_ron(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: Self = parse_ron(ron, "<inline>")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the controller cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.latency_ticks == 0 {
            return Err(TacticsError::invalid_config("latency_ticks", "must be positive"));
        }
        if !(self.angular_step > 0.0 && self.angular_step <= PI) {
            return Err(TacticsError::invalid_config(
                "angular_step",
                format!("{} is outside (0, π]", self.angular_step),
            ));
        }
        let positive = [
            ("compress_factor", self.compress_factor),
            ("evasion_scale_out", self.evasion_scale_out),
            ("evasion_scale_in", self.evasion_scale_in),
            ("strike_kill_health_scale", self.strike_kill_health_scale),
            ("strike_cell_factor", self.strike_cell_factor),
            ("cautious_far_coefficient", self.cautious_far_coefficient),
            ("cautious_near_coefficient", self.cautious_near_coefficient),
            ("factory_release_radius", self.factory_release_radius),
        ];
        for (field, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(TacticsError::invalid_config(field, format!("{value} must be positive")));
            }
        }
        let non_negative = [
            ("safety_margin", self.safety_margin),
            ("vision_epsilon", self.vision_epsilon),
            ("edge_margin", self.edge_margin),
            ("formation_spacing", self.formation_spacing),
            ("evasion_margin", self.evasion_margin),
            ("chain_distance", self.chain_distance),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(TacticsError::invalid_config(field, format!("{value} must not be negative")));
            }
        }
        for (field, value) in [
            ("damaged_health_fraction", self.damaged_health_fraction),
            ("resupply_damaged_share", self.resupply_damaged_share),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TacticsError::invalid_config(field, format!("{value} is outside [0, 1]")));
            }
        }
        if self.production_preference.is_empty() {
            return Err(TacticsError::invalid_config(
                "production_preference",
                "needs at least one category",
            ));
        }
        Ok(())
    }
}

pub(crate) fn read_ron<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|source| TacticsError::ReadError {
        path: path.display().to_string(),
        source,
    })?;
    parse_ron(&content, &path.display().to_string())
}

pub(crate) fn parse_ron<T: DeserializeOwned>(ron: &str, origin: &str) -> Result<T> {
    ron::from_str(ron).map_err(|e| TacticsError::ParseError {
        path: origin.to_string(),
        message: e.to_string(),
    })
}
