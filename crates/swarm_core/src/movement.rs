//! Collision-aware displacement search for one group.
//!
//! The planner does not build paths. It takes the straight vector towards a
//! destination, caps it to what one command round-trip can cover, and sweeps
//! rotations of it until one clears every same-domain group body or flight
//! corridor. When nothing clears, the group holds.

use std::f64::consts::FRAC_PI_2;

use crate::config::TacticsConfig;
use crate::constants::GameConstants;
use crate::geometry::{self, Segment};
use crate::groups::{Group, GroupRegistry};
use crate::math::Vec2;

/// Plans single-command displacements.
#[derive(Debug, Clone, Copy)]
pub struct MovePlanner<'a> {
    config: &'a TacticsConfig,
    constants: &'a GameConstants,
}

impl<'a> MovePlanner<'a> {
    /// Create a planner.
    #[must_use]
    pub fn new(config: &'a TacticsConfig, constants: &'a GameConstants) -> Self {
        Self { config, constants }
    }

    /// Longest displacement one command may ask of `group`.
    #[must_use]
    pub fn step_cap(&self, group: &Group) -> f64 {
        f64::from(self.config.latency_ticks) * group.max_speed
    }

    /// Rotation offsets in test order: 0, +step, -step, +2·step, ... below π.
    #[must_use]
    pub fn sweep_offsets(&self) -> Vec<f64> {
        let step = self.config.angular_step;
        let mut offsets = vec![0.0];
        let mut k = 1.0;
        while k * step < std::f64::consts::PI {
            offsets.push(k * step);
            offsets.push(-k * step);
            k += 1.0;
        }
        offsets
    }

    /// Displacement for `group` towards `destination`, zero to hold.
    #[must_use]
    pub fn plan(
        &self,
        group: &Group,
        destination: Vec2,
        avoid_enemy: bool,
        registry: &GroupRegistry,
    ) -> Vec2 {
        self.plan_from(group, group.centroid, destination, avoid_enemy, registry)
    }

    /// Like [`MovePlanner::plan`], with the displacement measured from
    /// `origin` instead of the centroid.
    #[must_use]
    pub fn plan_from(
        &self,
        group: &Group,
        origin: Vec2,
        destination: Vec2,
        avoid_enemy: bool,
        registry: &GroupRegistry,
    ) -> Vec2 {
        let wanted = (destination - origin).clamp_length(self.step_cap(group));
        if wanted.is_zero() {
            return Vec2::ZERO;
        }
        self.sweep_offsets()
            .into_iter()
            .map(|offset| wanted.rotate(offset))
            .find(|&candidate| {
                self.is_free(group, origin, candidate, registry)
                    && !(avoid_enemy && self.closes_on_enemy(group, origin, candidate))
            })
            .unwrap_or(Vec2::ZERO)
    }

    /// Whether moving `group` by `delta` from `origin` keeps clear of every
    /// other group of its domain.
    #[must_use]
    pub fn is_free(&self, group: &Group, origin: Vec2, delta: Vec2, registry: &GroupRegistry) -> bool {
        let path = Segment::new(origin, origin + delta);
        registry
            .iter()
            .filter(|other| other.tag != group.tag && !other.is_empty())
            .filter(|other| other.domain() == group.domain())
            .all(|other| {
                let clearance = group.radius + other.radius + self.config.safety_margin;
                let towards_other = other.centroid - origin;
                if towards_other.length() < clearance {
                    // Already touching: only moves pointing away are allowed.
                    return delta.signed_angle_to(towards_other).abs() > FRAC_PI_2;
                }
                match other.active_path {
                    Some(corridor) => {
                        geometry::distance_segment_to_segment(&path, &corridor) >= clearance
                    }
                    None => !geometry::circle_intersects_segment(other.centroid, clearance, &path),
                }
            })
    }

    /// Whether the move ends closer to the nearest enemy and inside its reach.
    fn closes_on_enemy(&self, group: &Group, origin: Vec2, delta: Vec2) -> bool {
        let Some(enemy) = group.nearest_enemy else {
            return false;
        };
        let reach = self
            .constants
            .stats(enemy.category)
            .attack_range_against(group.category)
            + group.radius;
        let end = (origin + delta).distance(enemy.position);
        end < origin.distance(enemy.position) && end < reach
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_queue::ActionQueue;
    use crate::entity_view::EntityView;
    use crate::units::{GroupTag, UnitCategory};
    use crate::world::{UnitSnapshot, WorldSnapshot};
    use std::f64::consts::FRAC_PI_8;

    fn registry_of(units: Vec<(u64, GroupTag, Vec2)>) -> GroupRegistry {
        let mut world = WorldSnapshot::empty(0, 1024.0, 1, 2);
        world.new_units = units
            .into_iter()
            .map(|(id, group, position)| UnitSnapshot {
                id,
                owner: 1,
                category: UnitCategory::GroundHeavy,
                position,
                health: 100,
                max_health: 100,
                group: Some(group),
            })
            .collect();
        let mut view = EntityView::new();
        view.ingest(&world);
        let constants = GameConstants::default();
        let mut registry = GroupRegistry::new();
        registry.adopt_untracked(&view, &constants);
        registry.refresh(&view, &constants, &TacticsConfig::default(), &ActionQueue::new());
        registry
    }

    #[test]
    fn test_sweep_has_fifteen_offsets() {
        let config = TacticsConfig::default();
        let constants = GameConstants::default();
        let offsets = MovePlanner::new(&config, &constants).sweep_offsets();
        assert_eq!(offsets.len(), 15);
        assert_eq!(offsets[0], 0.0);
        assert_eq!(offsets[1], FRAC_PI_8);
        assert_eq!(offsets[2], -FRAC_PI_8);
    }

    #[test]
    fn test_unobstructed_move_is_straight_and_capped() {
        let registry = registry_of(vec![(1, 1, Vec2::new(100.0, 100.0))]);
        let config = TacticsConfig::default();
        let constants = GameConstants::default();
        let planner = MovePlanner::new(&config, &constants);
        let group = registry.get(1).unwrap();

        let delta = planner.plan(group, Vec2::new(400.0, 100.0), false, &registry);
        assert!((delta.x - 52.0).abs() < 1e-9);
        assert!(delta.y.abs() < 1e-9);
    }

    #[test]
    fn test_blocked_straight_move_rotates() {
        // Group 2 sits right in the way of group 1 moving along +x.
        let registry = registry_of(vec![
            (1, 1, Vec2::new(100.0, 100.0)),
            (2, 2, Vec2::new(130.0, 100.0)),
        ]);
        let config = TacticsConfig::default();
        let constants = GameConstants::default();
        let planner = MovePlanner::new(&config, &constants);
        let group = registry.get(1).unwrap();

        let delta = planner.plan(group, Vec2::new(400.0, 100.0), false, &registry);
        assert!(!delta.is_zero());
        assert!(delta.y.abs() > 1e-6, "expected a rotated move, got {delta:?}");
    }

    #[test]
    fn test_reaching_destination_holds() {
        let registry = registry_of(vec![(1, 1, Vec2::new(100.0, 100.0))]);
        let config = TacticsConfig::default();
        let constants = GameConstants::default();
        let group = registry.get(1).unwrap();
        let delta =
            MovePlanner::new(&config, &constants).plan(group, group.centroid, false, &registry);
        assert_eq!(delta, Vec2::ZERO);
    }

    #[test]
    fn test_overlapping_group_may_only_leave() {
        let registry = registry_of(vec![
            (1, 1, Vec2::new(100.0, 100.0)),
            (2, 2, Vec2::new(104.0, 100.0)),
        ]);
        let config = TacticsConfig::default();
        let constants = GameConstants::default();
        let planner = MovePlanner::new(&config, &constants);
        let group = registry.get(1).unwrap();

        assert!(!planner.is_free(group, group.centroid, Vec2::new(10.0, 0.0), &registry));
        assert!(planner.is_free(group, group.centroid, Vec2::new(-10.0, 0.0), &registry));
    }
}
