//! Per-group maneuver choice for free play.
//!
//! Each settled group picks one maneuver per planning round: capture an
//! objective, fall back to the support group for repairs, engage, flank at
//! weapon range, or approach cautiously. The chosen destination goes through
//! the move planner and becomes one queued move.

use tracing::debug;

use crate::action_queue::{ActionQueue, Priority};
use crate::command::PendingCommand;
use crate::config::TacticsConfig;
use crate::constants::GameConstants;
use crate::entity_view::EntityView;
use crate::geometry::Segment;
use crate::groups::{EnemyContact, Group, GroupRegistry};
use crate::math::Vec2;
use crate::movement::MovePlanner;
use crate::units::{GroupTag, InstallationId, UnitCategory};

/// What a group does this round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Maneuver {
    /// Drive onto an installation.
    Capture {
        /// Target installation.
        installation: InstallationId,
        /// Installation center.
        point: Vec2,
    },
    /// Fly back to the support group.
    Resupply {
        /// Support group centroid.
        point: Vec2,
    },
    /// Advance straight onto the enemy.
    Engage {
        /// Enemy position.
        point: Vec2,
    },
    /// Bring the closest member to weapon range.
    Flank {
        /// Closest member position.
        from: Vec2,
        /// Point at weapon range from the enemy.
        to: Vec2,
    },
    /// Stop short of enemy vision and strike reach.
    Approach {
        /// Stand-off point.
        point: Vec2,
    },
    /// Stay put.
    Hold,
}

impl Maneuver {
    /// Start and end of the wanted displacement.
    #[must_use]
    pub fn route(&self, group: &Group) -> Option<(Vec2, Vec2)> {
        match *self {
            Self::Capture { point, .. }
            | Self::Resupply { point }
            | Self::Engage { point }
            | Self::Approach { point } => Some((group.centroid, point)),
            Self::Flank { from, to } => Some((from, to)),
            Self::Hold => None,
        }
    }

    /// Whether the move should keep out of enemy reach.
    #[must_use]
    pub fn avoids_enemy(&self, config: &TacticsConfig) -> bool {
        matches!(self, Self::Capture { .. } | Self::Resupply { .. })
            && config.avoid_enemy_on_objectives
    }
}

/// Summed health of the enemies chained to `start`.
///
/// Enemies are taken in order of distance from `start`; the chain continues
/// while each one lies within `chain_distance` beyond the previous one.
#[must_use]
pub fn chain_durability(view: &EntityView, start: Vec2, chain_distance: f64) -> u32 {
    let mut enemies: Vec<(f64, u32)> = view
        .enemy_units()
        .map(|e| (e.position.distance(start), e.health))
        .collect();
    enemies.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut total = 0;
    let mut previous: Option<f64> = None;
    for (distance, health) in enemies {
        if let Some(prev) = previous {
            if distance >= prev + chain_distance {
                break;
            }
        }
        total += health;
        previous = Some(distance);
    }
    total
}

/// Chooses and queues maneuvers.
#[derive(Debug, Clone, Copy)]
pub struct EngagementSelector<'a> {
    config: &'a TacticsConfig,
    constants: &'a GameConstants,
}

impl<'a> EngagementSelector<'a> {
    /// Create a selector.
    #[must_use]
    pub fn new(config: &'a TacticsConfig, constants: &'a GameConstants) -> Self {
        Self { config, constants }
    }

    /// Groups that may plan this round, closest to the enemy first.
    #[must_use]
    pub fn planning_order(registry: &GroupRegistry, excluded: Option<GroupTag>) -> Vec<GroupTag> {
        let mut ready: Vec<&Group> = registry
            .iter()
            .filter(|g| g.is_settled && !g.is_compressing && g.evasion.is_none())
            .filter(|g| !g.is_empty() && Some(g.tag) != excluded)
            .collect();
        ready.sort_by(|a, b| {
            let da = a.nearest_enemy.map_or(f64::INFINITY, |e| e.distance);
            let db = b.nearest_enemy.map_or(f64::INFINITY, |e| e.distance);
            da.total_cmp(&db).then(a.tag.cmp(&b.tag))
        });
        ready.into_iter().map(|g| g.tag).collect()
    }

    /// Pick the maneuver of one group.
    #[must_use]
    pub fn choose(&self, group: &Group, view: &EntityView, registry: &GroupRegistry) -> Maneuver {
        if !group.is_aerial {
            if let Some(id) = group.assigned_installation {
                if let Some(target) = view.installations().iter().find(|i| i.id == id) {
                    return Maneuver::Capture {
                        installation: id,
                        point: target.center(self.constants.installation_size),
                    };
                }
            }
        }

        let Some(enemy) = group.nearest_enemy else {
            return Maneuver::Hold;
        };

        if group.is_aerial && group.damaged_fraction > self.config.resupply_damaged_share {
            if let Some(support) = registry.support_group().filter(|s| s.tag != group.tag) {
                return Maneuver::Resupply {
                    point: support.centroid,
                };
            }
        }

        if group.category.is_good_against(enemy.category)
            && chain_durability(view, enemy.position, self.config.chain_distance)
                < group.durability
        {
            return Maneuver::Engage {
                point: enemy.position,
            };
        }

        if group.category.can_hit(enemy.category) {
            if let Some(flank) = self.flank(group, &enemy, view) {
                return flank;
            }
        }

        self.approach(group, &enemy, view)
    }

    fn flank(&self, group: &Group, enemy: &EnemyContact, view: &EntityView) -> Option<Maneuver> {
        let closest = view
            .members(group.tag)
            .map(|u| (u, u.position.distance(enemy.position)))
            .reduce(|best, c| if c.1 < best.1 { c } else { best })?;
        let (unit, distance) = closest;
        let range = self
            .constants
            .stats(unit.category)
            .attack_range_against(enemy.category);
        let to = unit.position.step_toward(enemy.position, distance - range);
        Some(Maneuver::Flank {
            from: unit.position,
            to,
        })
    }

    fn approach(&self, group: &Group, enemy: &EnemyContact, view: &EntityView) -> Maneuver {
        if enemy.distance == 0.0 {
            return Maneuver::Hold;
        }
        let coefficient = if view.me().remaining_strike_cooldown > self.config.cautious_cooldown_pivot
            && group.category != UnitCategory::GroundSupport
        {
            self.config.cautious_far_coefficient
        } else {
            self.config.cautious_near_coefficient
        };
        let stand_off = self.constants.max_vision_range() * coefficient
            + group.max_speed * f64::from(self.constants.strike.delay);
        Maneuver::Approach {
            point: group
                .centroid
                .step_toward(enemy.position, enemy.distance - stand_off),
        }
    }

    /// Queue one move for every ready group. Returns how many were queued.
    pub fn plan(
        &self,
        view: &EntityView,
        registry: &mut GroupRegistry,
        queue: &mut ActionQueue,
        excluded: Option<GroupTag>,
    ) -> usize {
        let planner = MovePlanner::new(self.config, self.constants);
        let mut queued = 0;
        for tag in Self::planning_order(registry, excluded) {
            let Some(group) = registry.get(tag) else {
                continue;
            };
            let maneuver = self.choose(group, view, registry);
            let Some((origin, destination)) = maneuver.route(group) else {
                continue;
            };
            let delta = planner.plan_from(
                group,
                origin,
                destination,
                maneuver.avoids_enemy(self.config),
                registry,
            );
            if delta.is_zero() {
                debug!(tick = view.tick(), group = tag, ?maneuver, "No free direction, holding");
                continue;
            }

            let max_speed = group.max_speed;
            let corridor = Segment::new(group.centroid, group.centroid + delta);
            queue.push_for_group(
                Priority::Ordinary,
                tag,
                PendingCommand::Move {
                    group: tag,
                    delta,
                    max_speed: Some(max_speed),
                },
            );
            if let Some(group) = registry.get_mut(tag) {
                group.active_path = Some(corridor);
            }
            debug!(tick = view.tick(), group = tag, ?maneuver, dx = delta.x, dy = delta.y, "Maneuver planned");
            queued += 1;
        }
        queued
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{UnitSnapshot, WorldSnapshot};

    fn unit(id: u64, owner: u64, category: UnitCategory, x: f64, y: f64, group: Option<GroupTag>) -> UnitSnapshot {
        UnitSnapshot {
            id,
            owner,
            category,
            position: Vec2::new(x, y),
            health: 100,
            max_health: 100,
            group,
        }
    }

    fn world_at(tick: u64, units: Vec<UnitSnapshot>) -> (EntityView, GroupRegistry) {
        let constants = GameConstants::default();
        let mut world = WorldSnapshot::empty(tick, 1024.0, 1, 2);
        world.new_units = units;
        let mut view = EntityView::new();
        view.ingest(&world);
        view.ingest(&WorldSnapshot::empty(tick + 10, 1024.0, 1, 2));
        let mut registry = GroupRegistry::new();
        registry.adopt_untracked(&view, &constants);
        registry.refresh(&view, &constants, &TacticsConfig::default(), &ActionQueue::new());
        (view, registry)
    }

    #[test]
    fn test_chain_durability_stops_at_gap() {
        let (view, _) = world_at(
            0,
            vec![
                unit(1, 2, UnitCategory::GroundHeavy, 100.0, 100.0, None),
                unit(2, 2, UnitCategory::GroundHeavy, 105.0, 100.0, None),
                unit(3, 2, UnitCategory::GroundHeavy, 112.0, 100.0, None),
                unit(4, 2, UnitCategory::GroundHeavy, 200.0, 100.0, None),
            ],
        );
        assert_eq!(chain_durability(&view, Vec2::new(100.0, 100.0), 10.0), 300);
    }

    #[test]
    fn test_strong_group_engages() {
        let (view, registry) = world_at(
            0,
            vec![
                unit(1, 1, UnitCategory::GroundHeavy, 100.0, 100.0, Some(1)),
                unit(2, 1, UnitCategory::GroundHeavy, 102.0, 100.0, Some(1)),
                unit(10, 2, UnitCategory::GroundLight, 300.0, 100.0, None),
            ],
        );
        let config = TacticsConfig::default();
        let constants = GameConstants::default();
        let selector = EngagementSelector::new(&config, &constants);
        let maneuver = selector.choose(registry.get(1).unwrap(), &view, &registry);
        assert_eq!(
            maneuver,
            Maneuver::Engage {
                point: Vec2::new(300.0, 100.0)
            }
        );
    }

    #[test]
    fn test_interceptor_against_ground_approaches() {
        let (view, registry) = world_at(
            0,
            vec![
                unit(1, 1, UnitCategory::AirInterceptor, 100.0, 100.0, Some(1)),
                unit(10, 2, UnitCategory::GroundHeavy, 500.0, 100.0, None),
            ],
        );
        let config = TacticsConfig::default();
        let constants = GameConstants::default();
        let selector = EngagementSelector::new(&config, &constants);
        let maneuver = selector.choose(registry.get(1).unwrap(), &view, &registry);
        // Stops 120 × 0.6 + 1.2 × 30 = 108 short of the enemy.
        match maneuver {
            Maneuver::Approach { point } => {
                assert!((point.x - 392.0).abs() < 1e-9);
                assert!((point.y - 100.0).abs() < 1e-9);
            }
            other => panic!("expected approach, got {other:?}"),
        }
    }

    #[test]
    fn test_outmatched_group_flanks() {
        let (view, registry) = world_at(
            0,
            vec![
                unit(1, 1, UnitCategory::GroundLight, 100.0, 100.0, Some(1)),
                unit(2, 1, UnitCategory::GroundLight, 110.0, 100.0, Some(1)),
                unit(10, 2, UnitCategory::GroundHeavy, 300.0, 100.0, None),
            ],
        );
        let config = TacticsConfig::default();
        let constants = GameConstants::default();
        let selector = EngagementSelector::new(&config, &constants);
        let maneuver = selector.choose(registry.get(1).unwrap(), &view, &registry);
        assert_eq!(
            maneuver,
            Maneuver::Flank {
                from: Vec2::new(110.0, 100.0),
                to: Vec2::new(282.0, 100.0),
            }
        );
    }

    #[test]
    fn test_damaged_aircraft_resupply() {
        let mut units = vec![
            unit(1, 1, UnitCategory::AirTransport, 100.0, 100.0, Some(1)),
            unit(5, 1, UnitCategory::GroundSupport, 50.0, 50.0, Some(2)),
            unit(10, 2, UnitCategory::GroundHeavy, 300.0, 100.0, None),
        ];
        units[0].health = 30;
        let (view, registry) = world_at(0, units);
        let config = TacticsConfig::default();
        let constants = GameConstants::default();
        let selector = EngagementSelector::new(&config, &constants);
        let maneuver = selector.choose(registry.get(1).unwrap(), &view, &registry);
        assert_eq!(
            maneuver,
            Maneuver::Resupply {
                point: Vec2::new(50.0, 50.0)
            }
        );
    }

    #[test]
    fn test_no_enemy_holds() {
        let (view, registry) = world_at(0, vec![unit(1, 1, UnitCategory::AirTransport, 100.0, 100.0, Some(1))]);
        let config = TacticsConfig::default();
        let constants = GameConstants::default();
        let selector = EngagementSelector::new(&config, &constants);
        assert_eq!(
            selector.choose(registry.get(1).unwrap(), &view, &registry),
            Maneuver::Hold
        );
    }

    #[test]
    fn test_planning_order_by_enemy_distance() {
        let (_, registry) = world_at(
            0,
            vec![
                unit(1, 1, UnitCategory::GroundHeavy, 100.0, 100.0, Some(1)),
                unit(2, 1, UnitCategory::GroundHeavy, 250.0, 100.0, Some(2)),
                unit(10, 2, UnitCategory::GroundHeavy, 300.0, 100.0, None),
            ],
        );
        assert_eq!(EngagementSelector::planning_order(&registry, None), vec![2, 1]);
        assert_eq!(EngagementSelector::planning_order(&registry, Some(2)), vec![1]);
    }

    #[test]
    fn test_plan_sets_active_path() {
        let (view, mut registry) = world_at(
            0,
            vec![
                unit(1, 1, UnitCategory::GroundHeavy, 100.0, 100.0, Some(1)),
                unit(10, 2, UnitCategory::GroundLight, 300.0, 100.0, None),
            ],
        );
        let config = TacticsConfig::default();
        let constants = GameConstants::default();
        let mut queue = ActionQueue::new();
        let queued = EngagementSelector::new(&config, &constants).plan(&view, &mut registry, &mut queue, None);
        assert_eq!(queued, 1);
        let path = registry.get(1).unwrap().active_path.unwrap();
        assert_eq!(path.from, Vec2::new(100.0, 100.0));
        assert!((path.to.x - 152.0).abs() < 1e-9);
    }
}
