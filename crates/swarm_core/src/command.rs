//! Host command vocabulary and the pending steps that produce it.
//!
//! Planners queue [`PendingCommand`] values. They are turned into host
//! [`Command`]s only when drained, so the fields reflect the world as it is
//! on the tick the command actually leaves.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TacticsConfig;
use crate::constants::GameConstants;
use crate::entity_view::EntityView;
use crate::math::Vec2;
use crate::units::{GroupTag, InstallationId, UnitCategory, UnitId};
use crate::visibility;

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum x.
    pub left: f64,
    /// Minimum y.
    pub top: f64,
    /// Maximum x.
    pub right: f64,
    /// Maximum y.
    pub bottom: f64,
}

impl Rect {
    /// Create a rectangle.
    #[must_use]
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Smallest rectangle containing every point, `None` for no points.
    pub fn bounding<I: IntoIterator<Item = Vec2>>(points: I) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Self::new(p.x, p.y, p.x, p.y),
                Some(r) => Self::new(
                    r.left.min(p.x),
                    r.top.min(p.y),
                    r.right.max(p.x),
                    r.bottom.max(p.y),
                ),
            })
        })
    }

    /// Grow every side by `amount`.
    #[must_use]
    pub fn expand(self, amount: f64) -> Self {
        Self::new(
            self.left - amount,
            self.top - amount,
            self.right + amount,
            self.bottom + amount,
        )
    }

    /// Whether `p` lies inside or on the border.
    #[must_use]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }
}

/// A command in the host's vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Select own units inside a rectangle, optionally one category only.
    SelectRect {
        /// Minimum x.
        left: f64,
        /// Minimum y.
        top: f64,
        /// Maximum x.
        right: f64,
        /// Maximum y.
        bottom: f64,
        /// Restrict the selection to one category.
        #[serde(default)]
        category: Option<UnitCategory>,
    },
    /// Select all members of a group.
    SelectGroup {
        /// Group tag.
        group: GroupTag,
    },
    /// Tag the current selection with a group.
    Assign {
        /// Group tag.
        group: GroupTag,
    },
    /// Remove a group from the current selection.
    Deselect {
        /// Group tag.
        group: GroupTag,
    },
    /// Move the selection by a displacement.
    Move {
        /// X displacement.
        dx: f64,
        /// Y displacement.
        dy: f64,
        /// Speed cap, the slowest member's speed when absent.
        #[serde(default)]
        max_speed: Option<f64>,
    },
    /// Scale the selection about a point.
    Scale {
        /// Pivot x.
        x: f64,
        /// Pivot y.
        y: f64,
        /// Scale factor.
        factor: f64,
    },
    /// Rotate the selection about a point.
    Rotate {
        /// Pivot x.
        x: f64,
        /// Pivot y.
        y: f64,
        /// Angle in radians.
        angle: f64,
        /// Angular speed cap.
        #[serde(default)]
        max_angular_speed: Option<f64>,
    },
    /// Switch a factory's production.
    StartProduction {
        /// Factory id.
        installation: InstallationId,
        /// Category to produce.
        category: UnitCategory,
    },
    /// Launch an area strike guided by a unit.
    AreaStrike {
        /// Impact x.
        x: f64,
        /// Impact y.
        y: f64,
        /// Guiding unit.
        caster: UnitId,
    },
}

/// A selection a queued step needs to be active.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Selection {
    /// Units inside a rectangle.
    Rect {
        /// Selection rectangle.
        rect: Rect,
        /// Category filter.
        category: Option<UnitCategory>,
    },
    /// Members of a group.
    Group(GroupTag),
}

impl Selection {
    /// Host command that establishes this selection.
    #[must_use]
    pub fn to_command(self) -> Command {
        match self {
            Self::Rect { rect, category } => Command::SelectRect {
                left: rect.left,
                top: rect.top,
                right: rect.right,
                bottom: rect.bottom,
                category,
            },
            Self::Group(group) => Command::SelectGroup { group },
        }
    }
}

/// A planned step, materialized into a [`Command`] at drain time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PendingCommand {
    /// Tag the selection with `group`.
    Assign {
        /// New tag.
        group: GroupTag,
    },
    /// Drop `group` from the selection.
    Deselect {
        /// Group tag.
        group: GroupTag,
    },
    /// Move `group` by `delta`.
    Move {
        /// Moving group.
        group: GroupTag,
        /// Displacement.
        delta: Vec2,
        /// Speed cap.
        max_speed: Option<f64>,
    },
    /// Scale `group` about a point.
    Scale {
        /// Scaled group.
        group: GroupTag,
        /// Pivot.
        about: Vec2,
        /// Factor.
        factor: f64,
    },
    /// Rotate `group` about a point.
    Rotate {
        /// Rotated group.
        group: GroupTag,
        /// Pivot.
        about: Vec2,
        /// Angle in radians.
        angle: f64,
    },
    /// Switch a factory's production.
    StartProduction {
        /// Factory id.
        installation: InstallationId,
        /// Category to produce.
        category: UnitCategory,
    },
    /// Launch an area strike.
    Strike {
        /// Impact point.
        point: Vec2,
        /// Guiding unit.
        caster: UnitId,
    },
}

impl PendingCommand {
    /// Group this step acts on, if any.
    #[must_use]
    pub fn group(&self) -> Option<GroupTag> {
        match self {
            Self::Assign { group }
            | Self::Deselect { group }
            | Self::Move { group, .. }
            | Self::Scale { group, .. }
            | Self::Rotate { group, .. } => Some(*group),
            Self::StartProduction { .. } | Self::Strike { .. } => None,
        }
    }

    /// Build the host command, or `None` when the step no longer applies.
    #[must_use]
    pub fn materialize(
        &self,
        view: &EntityView,
        constants: &GameConstants,
        config: &TacticsConfig,
    ) -> Option<Command> {
        match *self {
            Self::Assign { group } => Some(Command::Assign { group }),
            Self::Deselect { group } => Some(Command::Deselect { group }),
            Self::Move {
                group,
                delta,
                max_speed,
            } => {
                let delta = clamp_to_arena(view, group, delta, config.edge_margin);
                Some(Command::Move {
                    dx: delta.x,
                    dy: delta.y,
                    max_speed,
                })
            }
            Self::Scale { about, factor, .. } => Some(Command::Scale {
                x: about.x,
                y: about.y,
                factor,
            }),
            Self::Rotate { about, angle, .. } => Some(Command::Rotate {
                x: about.x,
                y: about.y,
                angle,
                max_angular_speed: None,
            }),
            Self::StartProduction {
                installation,
                category,
            } => Some(Command::StartProduction {
                installation,
                category,
            }),
            Self::Strike { point, caster } => {
                let spotter = view
                    .unit(caster)
                    .filter(|u| u.owner == view.me().id)
                    .filter(|u| {
                        visibility::can_see(u, point, view, constants, config.vision_epsilon)
                    });
                if spotter.is_none() {
                    debug!(tick = view.tick(), unit = caster, "Strike dropped: spotter lost sight");
                    return None;
                }
                Some(Command::AreaStrike {
                    x: point.x,
                    y: point.y,
                    caster,
                })
            }
        }
    }
}

/// Drop move components that would push a group into the arena border.
fn clamp_to_arena(view: &EntityView, group: GroupTag, delta: Vec2, margin: f64) -> Vec2 {
    let Some(bounds) = Rect::bounding(view.members(group).map(|u| u.position)) else {
        return delta;
    };
    let mut clamped = delta;
    if (delta.x < 0.0 && bounds.left < margin)
        || (delta.x > 0.0 && bounds.right > view.width() - margin)
    {
        clamped.x = 0.0;
    }
    if (delta.y < 0.0 && bounds.top < margin)
        || (delta.y > 0.0 && bounds.bottom > view.height() - margin)
    {
        clamped.y = 0.0;
    }
    clamped
}
