//! Area-strike targeting and evasion.
//!
//! Offense scores every visible enemy position by how many enemies a strike
//! there would catch and how many it would likely destroy, then looks for an
//! own unit close enough to guide it. Evasion disperses groups away from an
//! announced opponent strike and regathers them once it has passed.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::action_queue::{ActionQueue, Priority};
use crate::command::PendingCommand;
use crate::config::TacticsConfig;
use crate::constants::{GameConstants, StrikeConstants};
use crate::entity_view::{EntityView, Unit};
use crate::groups::GroupRegistry;
use crate::math::Vec2;
use crate::units::{GroupTag, UnitId};
use crate::visibility;
use crate::world::PlayerState;

/// Whether `player` has a launched strike that has not detonated yet.
///
/// A launch resets the cooldown to `base − centers × decrease`; the strike
/// lands `delay` ticks later.
#[must_use]
pub fn is_strike_armed(player: &PlayerState, control_centers: usize, strike: &StrikeConstants) -> bool {
    let armed_from =
        i64::from(strike.cooldown_for(control_centers)) - i64::from(strike.delay);
    player.remaining_strike_cooldown > 0 && i64::from(player.remaining_strike_cooldown) >= armed_from
}

/// Enemies a strike at one point would catch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointScore {
    /// Enemies strictly inside the blast radius.
    pub count: usize,
    /// Of those, enemies whose health is below the expected damage.
    pub likely_destroyed: usize,
}

impl PointScore {
    /// Weighted score.
    #[must_use]
    pub fn score(&self, kill_weight: usize) -> usize {
        self.count + kill_weight * self.likely_destroyed
    }
}

/// Score a strike at `point` against `(position, health)` pairs.
#[must_use]
pub fn score_point(point: Vec2, enemies: &[(Vec2, u32)], radius: f64, kill_health_scale: f64) -> PointScore {
    enemies
        .iter()
        .fold(PointScore::default(), |mut score, &(position, health)| {
            let distance = position.distance(point);
            if distance < radius {
                score.count += 1;
                if f64::from(health) <= kill_health_scale * (1.0 - distance / radius) {
                    score.likely_destroyed += 1;
                }
            }
            score
        })
}

/// Uniform bucket grid over unit positions.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: BTreeMap<(i64, i64), Vec<usize>>,
}

impl SpatialGrid {
    /// Bucket `points` by cell. Indices refer to the input order.
    #[must_use]
    pub fn build(points: &[Vec2], cell_size: f64) -> Self {
        let mut cells: BTreeMap<(i64, i64), Vec<usize>> = BTreeMap::new();
        for (index, point) in points.iter().enumerate() {
            cells.entry(Self::key(*point, cell_size)).or_default().push(index);
        }
        Self { cell_size, cells }
    }

    fn key(point: Vec2, cell_size: f64) -> (i64, i64) {
        (
            (point.x / cell_size).floor() as i64,
            (point.y / cell_size).floor() as i64,
        )
    }

    /// Indices in the cell of `point` and its eight neighbours, ascending.
    #[must_use]
    pub fn neighbourhood(&self, point: Vec2) -> Vec<usize> {
        let (cx, cy) = Self::key(point, self.cell_size);
        let mut found: Vec<usize> = (-1..=1)
            .flat_map(|dx| (-1..=1).map(move |dy| (cx + dx, cy + dy)))
            .filter_map(|key| self.cells.get(&key))
            .flatten()
            .copied()
            .collect();
        found.sort_unstable();
        found
    }
}

/// A chosen strike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrikeTarget {
    /// Impact point.
    pub point: Vec2,
    /// Guiding unit.
    pub caster: UnitId,
    /// Group of the guiding unit.
    pub caster_group: Option<GroupTag>,
    /// Catch at the impact point.
    pub score: PointScore,
}

/// Best strike available now, if any.
///
/// Candidate points are enemy positions. A candidate needs more than the
/// minimum number of enemies in its blast radius and an own unit that sees
/// it; the first strictly best `(spotter, point)` pair wins.
#[must_use]
pub fn find_strike_target(
    view: &EntityView,
    constants: &GameConstants,
    config: &TacticsConfig,
) -> Option<StrikeTarget> {
    let enemies: Vec<&Unit> = view.enemy_units().collect();
    let friends: Vec<&Unit> = view.own_units().collect();
    if enemies.is_empty() || friends.is_empty() {
        return None;
    }

    let radius = constants.strike.radius;
    let samples: Vec<(Vec2, u32)> = enemies.iter().map(|e| (e.position, e.health)).collect();
    let scores: Vec<PointScore> = enemies
        .iter()
        .map(|e| score_point(e.position, &samples, radius, config.strike_kill_health_scale))
        .collect();

    let cell_size = config.strike_cell_factor * constants.max_vision_range();
    let enemy_points: Vec<Vec2> = enemies.iter().map(|e| e.position).collect();
    let grid = SpatialGrid::build(&enemy_points, cell_size);

    friends
        .iter()
        .flat_map(|friend| {
            grid.neighbourhood(friend.position)
                .into_iter()
                .map(move |index| (*friend, index))
        })
        .filter(|&(_, index)| scores[index].count > config.strike_min_targets)
        .filter(|&(friend, index)| {
            visibility::can_see(friend, enemies[index].position, view, constants, config.vision_epsilon)
        })
        .fold(None, |best: Option<(usize, StrikeTarget)>, (friend, index)| {
            let value = scores[index].score(config.strike_kill_weight);
            match best {
                Some((best_value, _)) if best_value >= value => best,
                _ => Some((
                    value,
                    StrikeTarget {
                        point: enemies[index].position,
                        caster: friend.id,
                        caster_group: friend.group,
                        score: scores[index],
                    },
                )),
            }
        })
        .map(|(_, target)| target)
}

/// Runs offensive strikes and evasion across ticks.
#[derive(Debug, Clone, Default)]
pub struct StrikeCoordinator {
    strike_group: Option<GroupTag>,
}

impl StrikeCoordinator {
    /// Create a coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Group guiding the own strike in flight, if any.
    #[must_use]
    pub fn strike_group(&self) -> Option<GroupTag> {
        self.strike_group
    }

    /// Forget the guiding group once the own strike has landed or was
    /// dropped before launch.
    pub fn update(&mut self, view: &EntityView, constants: &GameConstants, queue: &ActionQueue) {
        let me = view.me();
        if self.strike_group.is_some()
            && queue.is_idle(Priority::Urgent)
            && !is_strike_armed(me, view.control_centers_owned_by(me.id), &constants.strike)
        {
            debug!(tick = view.tick(), group = ?self.strike_group, "Strike group released");
            self.strike_group = None;
        }
    }

    /// Queue a strike if a worthwhile target is in sight.
    ///
    /// The guiding unit's group is halted first and kept out of maneuver
    /// planning until the strike lands.
    pub fn plan_offense(
        &mut self,
        view: &EntityView,
        constants: &GameConstants,
        config: &TacticsConfig,
        registry: &mut GroupRegistry,
        queue: &mut ActionQueue,
    ) -> bool {
        if view.me().remaining_strike_cooldown > 0 || !queue.is_idle(Priority::Urgent) {
            return false;
        }
        let Some(target) = find_strike_target(view, constants, config) else {
            return false;
        };

        if let Some(tag) = target.caster_group {
            if let Some(group) = registry.get(tag) {
                if group.is_compressing {
                    debug!(tick = view.tick(), group = tag, "Strike deferred: spotter group compressing");
                    return false;
                }
                queue.cancel_ordinary_for(tag);
                queue.push_for_group(
                    Priority::Urgent,
                    tag,
                    PendingCommand::Move {
                        group: tag,
                        delta: Vec2::ZERO,
                        max_speed: None,
                    },
                );
                self.strike_group = Some(tag);
            }
        }

        queue.push(
            Priority::Urgent,
            None,
            PendingCommand::Strike {
                point: target.point,
                caster: target.caster,
            },
        );
        info!(
            tick = view.tick(),
            unit = target.caster,
            x = target.point.x,
            y = target.point.y,
            count = target.score.count,
            likely_destroyed = target.score.likely_destroyed,
            "Strike planned"
        );
        true
    }

    /// Disperse groups threatened by an armed opponent strike, and regather
    /// dispersed groups once no strike is armed. Returns the number of steps
    /// queued.
    pub fn plan_evasion(
        &mut self,
        view: &EntityView,
        constants: &GameConstants,
        config: &TacticsConfig,
        registry: &mut GroupRegistry,
        queue: &mut ActionQueue,
    ) -> usize {
        let opponent = view.opponent();
        let armed = is_strike_armed(
            opponent,
            view.control_centers_owned_by(opponent.id),
            &constants.strike,
        );
        let threat = opponent.next_strike.filter(|_| armed).map(|s| s.point);
        let danger = config.evasion_margin + constants.strike.radius;
        let mut queued = 0;

        for group in registry.iter_mut().filter(|g| !g.is_empty()) {
            match (threat, group.evasion) {
                (Some(point), None) if group.centroid.distance(point) < danger => {
                    queue.cancel_ordinary_for(group.tag);
                    queue.push_for_group(
                        Priority::Urgent,
                        group.tag,
                        PendingCommand::Scale {
                            group: group.tag,
                            about: point,
                            factor: config.evasion_scale_out,
                        },
                    );
                    group.evasion = Some(point);
                    group.active_path = None;
                    info!(tick = view.tick(), group = group.tag, "Evading opponent strike");
                    queued += 1;
                }
                (None, Some(point)) => {
                    queue.push_for_group(
                        Priority::Urgent,
                        group.tag,
                        PendingCommand::Scale {
                            group: group.tag,
                            about: point,
                            factor: config.evasion_scale_in,
                        },
                    );
                    group.evasion = None;
                    group.is_compressing = true;
                    info!(tick = view.tick(), group = group.tag, "Regathering after strike");
                    queued += 1;
                }
                _ => {}
            }
        }
        queued
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::UnitCategory;
    use crate::world::{StrikeAnnouncement, UnitSnapshot, WorldSnapshot};

    fn enemy_cluster(first_id: u64, center: Vec2, count: usize) -> Vec<UnitSnapshot> {
        (0..count)
            .map(|i| UnitSnapshot {
                id: first_id + i as u64,
                owner: 2,
                category: UnitCategory::GroundHeavy,
                position: center + Vec2::new((i % 4) as f64 * 4.0, (i / 4) as f64 * 4.0),
                health: 100,
                max_health: 100,
                group: None,
            })
            .collect()
    }

    fn spotter(id: u64, at: Vec2, group: Option<GroupTag>) -> UnitSnapshot {
        UnitSnapshot {
            id,
            owner: 1,
            category: UnitCategory::AirInterceptor,
            position: at,
            health: 100,
            max_health: 100,
            group,
        }
    }

    fn view_of(units: Vec<UnitSnapshot>) -> EntityView {
        let mut world = WorldSnapshot::empty(0, 1024.0, 1, 2);
        world.new_units = units;
        let mut view = EntityView::new();
        view.ingest(&world);
        view
    }

    #[test]
    fn test_armed_window() {
        let strike = StrikeConstants::default();
        let mut player = PlayerState::default();
        assert!(!is_strike_armed(&player, 0, &strike));
        player.remaining_strike_cooldown = 1200;
        assert!(is_strike_armed(&player, 0, &strike));
        player.remaining_strike_cooldown = 1170;
        assert!(is_strike_armed(&player, 0, &strike));
        player.remaining_strike_cooldown = 1169;
        assert!(!is_strike_armed(&player, 0, &strike));
        player.remaining_strike_cooldown = 1110;
        assert!(is_strike_armed(&player, 2, &strike));
    }

    #[test]
    fn test_score_counts_and_kills() {
        let enemies = [
            (Vec2::new(0.0, 0.0), 100),
            (Vec2::new(25.0, 0.0), 40),
            (Vec2::new(60.0, 0.0), 1),
        ];
        let score = score_point(Vec2::ZERO, &enemies, 50.0, 99.0);
        assert_eq!(score.count, 2);
        // 40 <= 99 × 0.5, 100 > 99
        assert_eq!(score.likely_destroyed, 1);
        assert_eq!(score.score(2), 4);
    }

    #[test]
    fn test_neighbourhood_covers_adjacent_cells() {
        let points = [Vec2::new(10.0, 10.0), Vec2::new(110.0, 10.0), Vec2::new(300.0, 300.0)];
        let grid = SpatialGrid::build(&points, 100.0);
        assert_eq!(grid.neighbourhood(Vec2::new(50.0, 50.0)), vec![0, 1]);
    }

    #[test]
    fn test_target_needs_enough_enemies() {
        let mut units = enemy_cluster(100, Vec2::new(400.0, 400.0), 5);
        units.push(spotter(1, Vec2::new(350.0, 400.0), None));
        let view = view_of(units);
        assert!(find_strike_target(&view, &GameConstants::default(), &TacticsConfig::default()).is_none());
    }

    #[test]
    fn test_target_found_with_spotter() {
        let mut units = enemy_cluster(100, Vec2::new(400.0, 400.0), 12);
        units.push(spotter(1, Vec2::new(350.0, 400.0), Some(3)));
        let view = view_of(units);
        let target =
            find_strike_target(&view, &GameConstants::default(), &TacticsConfig::default()).unwrap();
        assert_eq!(target.caster, 1);
        assert_eq!(target.caster_group, Some(3));
        assert_eq!(target.score.count, 12);
    }

    #[test]
    fn test_blind_spotter_finds_nothing() {
        let mut units = enemy_cluster(100, Vec2::new(400.0, 400.0), 12);
        units.push(spotter(1, Vec2::new(200.0, 400.0), None));
        let view = view_of(units);
        assert!(find_strike_target(&view, &GameConstants::default(), &TacticsConfig::default()).is_none());
    }

    #[test]
    fn test_offense_halts_spotter_group() {
        let mut units = enemy_cluster(100, Vec2::new(400.0, 400.0), 12);
        units.push(spotter(1, Vec2::new(350.0, 400.0), Some(3)));
        let view = view_of(units);
        let constants = GameConstants::default();
        let config = TacticsConfig::default();
        let mut registry = GroupRegistry::new();
        registry.adopt_untracked(&view, &constants);
        let mut queue = ActionQueue::new();
        let mut coordinator = StrikeCoordinator::new();

        assert!(coordinator.plan_offense(&view, &constants, &config, &mut registry, &mut queue));
        assert_eq!(coordinator.strike_group(), Some(3));
        let steps: Vec<&PendingCommand> = queue.iter(Priority::Urgent).map(|q| &q.command).collect();
        assert!(matches!(steps[0], PendingCommand::Move { group: 3, delta, .. } if delta.is_zero()));
        assert!(matches!(steps[1], PendingCommand::Strike { caster: 1, .. }));
    }

    #[test]
    fn test_evasion_scales_out_then_in() {
        let constants = GameConstants::default();
        let config = TacticsConfig::default();
        let view = view_of(vec![spotter(1, Vec2::new(100.0, 100.0), Some(1))]);
        let mut registry = GroupRegistry::new();
        registry.adopt_untracked(&view, &constants);
        registry.refresh(&view, &constants, &config, &ActionQueue::new());
        let mut queue = ActionQueue::new();
        let mut coordinator = StrikeCoordinator::new();

        let mut world = WorldSnapshot::empty(1, 1024.0, 1, 2);
        world.opponent.remaining_strike_cooldown = 1200;
        world.opponent.next_strike = Some(StrikeAnnouncement {
            point: Vec2::new(130.0, 100.0),
            caster: 99,
        });
        let mut threatened = view.clone();
        threatened.ingest(&world);

        assert_eq!(coordinator.plan_evasion(&threatened, &constants, &config, &mut registry, &mut queue), 1);
        assert_eq!(registry.get(1).unwrap().evasion, Some(Vec2::new(130.0, 100.0)));
        // A threat already being evaded is not queued twice.
        assert_eq!(coordinator.plan_evasion(&threatened, &constants, &config, &mut registry, &mut queue), 0);

        let mut calm = threatened.clone();
        calm.ingest(&WorldSnapshot::empty(40, 1024.0, 1, 2));
        assert_eq!(coordinator.plan_evasion(&calm, &constants, &config, &mut registry, &mut queue), 1);
        let group = registry.get(1).unwrap();
        assert!(group.evasion.is_none());
        assert!(group.is_compressing);
    }
}
