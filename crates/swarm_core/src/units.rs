//! Unit categories, identifiers and the counter-type tables.

use serde::{Deserialize, Serialize};

/// Host identifier of a unit.
pub type UnitId = u64;

/// Host identifier of a player.
pub type PlayerId = u64;

/// Host identifier of an installation.
pub type InstallationId = u64;

/// Group tag assigned to own units.
pub type GroupTag = u32;

/// Movement domain. Collision avoidance never crosses domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Ground vehicles.
    Ground,
    /// Aircraft.
    Air,
}

/// Unit category.
///
/// Generalizes the five unit kinds of the host: heavy tank, light armor,
/// support vehicle, fighter-type aircraft and helicopter-type aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitCategory {
    /// Heavy tank.
    GroundHeavy,
    /// Light armored vehicle.
    GroundLight,
    /// Repair and supply vehicle.
    GroundSupport,
    /// Fighter-type aircraft.
    AirInterceptor,
    /// Helicopter-type aircraft.
    AirTransport,
}

impl UnitCategory {
    /// All categories in a stable order.
    pub const ALL: [Self; 5] = [
        Self::GroundHeavy,
        Self::GroundLight,
        Self::GroundSupport,
        Self::AirInterceptor,
        Self::AirTransport,
    ];

    /// Whether the category flies.
    #[must_use]
    pub const fn is_aerial(self) -> bool {
        matches!(self, Self::AirInterceptor | Self::AirTransport)
    }

    /// Movement domain of the category.
    #[must_use]
    pub const fn domain(self) -> Domain {
        if self.is_aerial() {
            Domain::Air
        } else {
            Domain::Ground
        }
    }

    /// Whether the initial partition keeps this category in a single group
    /// instead of splitting it into quadrants.
    #[must_use]
    pub const fn forms_single_group(self) -> bool {
        matches!(self, Self::AirInterceptor | Self::GroundSupport)
    }

    /// Counter-type table: does `self` have the upper hand against `other`?
    #[must_use]
    pub const fn is_good_against(self, other: Self) -> bool {
        use UnitCategory::*;
        match self {
            GroundSupport => false,
            AirInterceptor => matches!(other, AirTransport | AirInterceptor),
            AirTransport => matches!(
                other,
                GroundHeavy | GroundSupport | GroundLight | AirTransport
            ),
            GroundLight => matches!(other, AirTransport | AirInterceptor | GroundSupport),
            GroundHeavy => matches!(
                other,
                AirInterceptor | GroundHeavy | GroundLight | GroundSupport
            ),
        }
    }

    /// Can `self` deal any damage to `other` at all?
    #[must_use]
    pub const fn can_hit(self, other: Self) -> bool {
        match self {
            Self::AirInterceptor => other.is_aerial(),
            Self::GroundHeavy | Self::GroundLight | Self::AirTransport => true,
            Self::GroundSupport => false,
        }
    }
}
