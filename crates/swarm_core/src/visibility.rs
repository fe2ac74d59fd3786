//! Sight checks with terrain and weather modifiers.

use crate::constants::GameConstants;
use crate::entity_view::{EntityView, Unit};
use crate::math::Vec2;

/// Effective sight distance of `unit` at its current cell.
///
/// Ground units use the terrain factor, aircraft the weather factor.
#[must_use]
pub fn effective_vision(unit: &Unit, view: &EntityView, constants: &GameConstants) -> f64 {
    let base = constants.stats(unit.category).vision_range;
    base * vision_factor(unit, view, constants)
}

/// Terrain or weather multiplier for `unit`'s cell.
#[must_use]
pub fn vision_factor(unit: &Unit, view: &EntityView, constants: &GameConstants) -> f64 {
    if unit.category.is_aerial() {
        constants
            .vision
            .weather(view.weather_at(unit.position, constants.cell_size))
    } else {
        constants
            .vision
            .terrain(view.terrain_at(unit.position, constants.cell_size))
    }
}

/// Whether a viewer with `effective_range` at `from` sees `point`.
#[must_use]
pub fn sees_within(from: Vec2, point: Vec2, effective_range: f64, epsilon: f64) -> bool {
    from.distance(point) < effective_range - epsilon
}

/// Whether `unit` can see `point`.
#[must_use]
pub fn can_see(
    unit: &Unit,
    point: Vec2,
    view: &EntityView,
    constants: &GameConstants,
    epsilon: f64,
) -> bool {
    sees_within(
        unit.position,
        point,
        effective_vision(unit, view, constants),
        epsilon,
    )
}
