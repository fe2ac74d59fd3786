//! One-shot setup sequence that turns the spawn layout into compact groups.
//!
//! Phases advance in a fixed order, each only once every group has settled
//! and the ordinary queue has drained:
//!
//! 1. `Unsplit → HorizontallyAligned`: tag spawn blocks as groups (quadrants
//!    per category, one group for solo categories) and spread each row apart.
//! 2. `HorizontallyAligned → VerticallyAligned`: spread each column apart.
//! 3. `VerticallyAligned → Compressed`: scale every group about its centroid.
//! 4. `Compressed → Released`: free maneuver takes over for good.

use tracing::info;

use crate::action_queue::{ActionQueue, Priority};
use crate::command::{PendingCommand, Rect, Selection};
use crate::config::TacticsConfig;
use crate::constants::GameConstants;
use crate::entity_view::EntityView;
use crate::groups::GroupRegistry;
use crate::math::{self, Vec2};
use crate::units::{Domain, GroupTag, UnitCategory};

/// Setup phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormationPhase {
    /// Spawn layout, no groups yet.
    Unsplit,
    /// Groups tagged and rows spread.
    HorizontallyAligned,
    /// Columns spread.
    VerticallyAligned,
    /// Groups compressed.
    Compressed,
    /// Setup finished.
    Released,
}

const TRANSITIONS: [(FormationPhase, FormationPhase); 4] = [
    (FormationPhase::Unsplit, FormationPhase::HorizontallyAligned),
    (FormationPhase::HorizontallyAligned, FormationPhase::VerticallyAligned),
    (FormationPhase::VerticallyAligned, FormationPhase::Compressed),
    (FormationPhase::Compressed, FormationPhase::Released),
];

impl FormationPhase {
    /// Phase that follows this one, `None` for the terminal phase.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        TRANSITIONS
            .iter()
            .find(|(from, _)| *from == self)
            .map(|(_, to)| *to)
    }
}

/// Body of a group on one axis pass: where it is and how wide it is.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    tag: GroupTag,
    domain: Domain,
    centroid: Vec2,
    radius: f64,
}

/// Drives the setup phases.
#[derive(Debug, Clone)]
pub struct FormationSequencer {
    phase: FormationPhase,
}

impl Default for FormationSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl FormationSequencer {
    /// Start at [`FormationPhase::Unsplit`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: FormationPhase::Unsplit,
        }
    }

    /// Skip setup entirely.
    #[must_use]
    pub fn released() -> Self {
        Self {
            phase: FormationPhase::Released,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> FormationPhase {
        self.phase
    }

    /// Whether setup is over.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.phase == FormationPhase::Released
    }

    /// Fire the next transition if everything has settled.
    ///
    /// Returns `true` when a transition fired. Calling again before the
    /// queued batch has settled does nothing.
    pub fn advance(
        &mut self,
        view: &EntityView,
        constants: &GameConstants,
        config: &TacticsConfig,
        registry: &mut GroupRegistry,
        queue: &mut ActionQueue,
    ) -> bool {
        let Some(next) = self.phase.next() else {
            return false;
        };
        if !registry.all_settled() || !queue.is_idle(Priority::Ordinary) {
            return false;
        }

        match self.phase {
            FormationPhase::Unsplit => {
                let placements = split_into_groups(view, constants, registry, queue);
                spread(&placements, Axis::X, config.formation_spacing, queue);
            }
            FormationPhase::HorizontallyAligned => {
                let placements: Vec<Placement> = registry
                    .iter()
                    .filter(|g| !g.is_empty())
                    .map(|g| Placement {
                        tag: g.tag,
                        domain: g.domain(),
                        centroid: g.centroid,
                        radius: g.radius,
                    })
                    .collect();
                spread(&placements, Axis::Y, config.formation_spacing, queue);
            }
            FormationPhase::VerticallyAligned => {
                for group in registry.iter_mut().filter(|g| !g.is_empty()) {
                    queue.push_for_group(
                        Priority::Ordinary,
                        group.tag,
                        PendingCommand::Scale {
                            group: group.tag,
                            about: group.centroid,
                            factor: config.compress_factor,
                        },
                    );
                    group.is_compressing = true;
                }
            }
            FormationPhase::Compressed | FormationPhase::Released => {}
        }

        info!(tick = view.tick(), from = ?self.phase, to = ?next, "Formation phase advanced");
        self.phase = next;
        true
    }
}

/// Tag untagged own units as groups, one batch per rectangle.
fn split_into_groups(
    view: &EntityView,
    constants: &GameConstants,
    registry: &mut GroupRegistry,
    queue: &mut ActionQueue,
) -> Vec<Placement> {
    let mut placements = Vec::new();
    for category in UnitCategory::ALL {
        let positions: Vec<Vec2> = view
            .untagged_own()
            .filter(|u| u.category == category)
            .map(|u| u.position)
            .collect();
        let Some(bounds) = Rect::bounding(positions.iter().copied()) else {
            continue;
        };
        let bounds = bounds.expand(1.0);

        let rects = if category.forms_single_group() {
            vec![bounds]
        } else {
            let xs: Vec<f64> = positions.iter().map(|p| p.x).collect();
            let ys: Vec<f64> = positions.iter().map(|p| p.y).collect();
            quadrants(
                bounds,
                split_coordinate(&xs, bounds.left, bounds.right),
                split_coordinate(&ys, bounds.top, bounds.bottom),
            )
        };

        for rect in rects {
            let inside: Vec<Vec2> = positions.iter().copied().filter(|p| rect.contains(*p)).collect();
            let Some(centroid) = math::mean(inside.iter().copied()) else {
                continue;
            };
            let radius = inside.iter().map(|p| p.distance(centroid)).fold(0.0, f64::max);
            let tag = registry.create(category, constants);
            queue.push(
                Priority::Ordinary,
                Some(Selection::Rect {
                    rect,
                    category: Some(category),
                }),
                PendingCommand::Assign { group: tag },
            );
            placements.push(Placement {
                tag,
                domain: category.domain(),
                centroid,
                radius,
            });
        }
    }
    placements
}

fn quadrants(bounds: Rect, split_x: Option<f64>, split_y: Option<f64>) -> Vec<Rect> {
    let columns = match split_x {
        Some(x) => vec![(bounds.left, x), (x, bounds.right)],
        None => vec![(bounds.left, bounds.right)],
    };
    let rows = match split_y {
        Some(y) => vec![(bounds.top, y), (y, bounds.bottom)],
        None => vec![(bounds.top, bounds.bottom)],
    };
    rows.iter()
        .flat_map(|&(top, bottom)| {
            columns
                .iter()
                .map(move |&(left, right)| Rect::new(left, top, right, bottom))
        })
        .collect()
}

/// Split line between unit coordinates, in the gap closest to the middle of
/// `[low, high]`. Ties go to the wider gap. `None` when all coordinates are
/// equal.
#[must_use]
pub fn split_coordinate(values: &[f64], low: f64, high: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    let middle = (low + high) / 2.0;
    sorted
        .windows(2)
        .map(|w| ((w[0] + w[1]) / 2.0, w[1] - w[0]))
        .reduce(|best, gap| {
            let best_off = (best.0 - middle).abs();
            let gap_off = (gap.0 - middle).abs();
            if gap_off < best_off || (gap_off == best_off && gap.1 > best.1) {
                gap
            } else {
                best
            }
        })
        .map(|(split, _)| split)
}

/// Push bodies along one axis so neighbours keep `r1 + r2 + spacing` apart.
///
/// Input is `(coordinate, radius)` pairs; the result holds the target
/// coordinate of each pair in input order. The lowest body never moves and
/// bodies only move towards higher coordinates.
#[must_use]
pub fn spread_axis(bodies: &[(f64, f64)], spacing: f64) -> Vec<f64> {
    let mut order: Vec<usize> = (0..bodies.len()).collect();
    order.sort_by(|&a, &b| bodies[a].0.total_cmp(&bodies[b].0).then(a.cmp(&b)));

    let mut targets = vec![0.0; bodies.len()];
    let mut previous: Option<(f64, f64)> = None;
    for index in order {
        let (coordinate, radius) = bodies[index];
        let target = match previous {
            Some((prev_target, prev_radius)) => {
                coordinate.max(prev_target + prev_radius + radius + spacing)
            }
            None => coordinate,
        };
        targets[index] = target;
        previous = Some((target, radius));
    }
    targets
}

/// Partition intervals into clusters of transitively overlapping ones.
#[must_use]
pub fn cluster_overlapping(intervals: &[(f64, f64)]) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..intervals.len()).collect();
    order.sort_by(|&a, &b| intervals[a].0.total_cmp(&intervals[b].0).then(a.cmp(&b)));

    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut reach = f64::NEG_INFINITY;
    for index in order {
        let (start, end) = intervals[index];
        match clusters.last_mut() {
            Some(cluster) if start <= reach => {
                cluster.push(index);
                reach = reach.max(end);
            }
            _ => {
                clusters.push(vec![index]);
                reach = end;
            }
        }
    }
    clusters
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

/// Queue moves that spread rows (`Axis::X`) or columns (`Axis::Y`) apart.
fn spread(placements: &[Placement], axis: Axis, spacing: f64, queue: &mut ActionQueue) {
    for domain in [Domain::Ground, Domain::Air] {
        let bodies: Vec<&Placement> = placements.iter().filter(|p| p.domain == domain).collect();
        // Rows share a vertical extent, columns a horizontal one.
        let extents: Vec<(f64, f64)> = bodies
            .iter()
            .map(|p| {
                let across = match axis {
                    Axis::X => p.centroid.y,
                    Axis::Y => p.centroid.x,
                };
                (across - p.radius, across + p.radius)
            })
            .collect();

        for cluster in cluster_overlapping(&extents) {
            let along: Vec<(f64, f64)> = cluster
                .iter()
                .map(|&i| {
                    let p = bodies[i];
                    let coordinate = match axis {
                        Axis::X => p.centroid.x,
                        Axis::Y => p.centroid.y,
                    };
                    (coordinate, p.radius)
                })
                .collect();
            let targets = spread_axis(&along, spacing);

            for (slot, &i) in cluster.iter().enumerate() {
                let shift = targets[slot] - along[slot].0;
                if shift <= 0.0 {
                    continue;
                }
                let delta = match axis {
                    Axis::X => Vec2::new(shift, 0.0),
                    Axis::Y => Vec2::new(0.0, shift),
                };
                let tag = bodies[i].tag;
                queue.push_for_group(
                    Priority::Ordinary,
                    tag,
                    PendingCommand::Move {
                        group: tag,
                        delta,
                        max_speed: None,
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{UnitSnapshot, WorldSnapshot};

    fn block(first_id: u64, category: UnitCategory, origin: Vec2, side: usize) -> Vec<UnitSnapshot> {
        let mut units = Vec::new();
        for row in 0..side {
            for column in 0..side {
                units.push(UnitSnapshot {
                    id: first_id + (row * side + column) as u64,
                    owner: 1,
                    category,
                    position: origin + Vec2::new(column as f64 * 6.0, row as f64 * 6.0),
                    health: 100,
                    max_health: 100,
                    group: None,
                });
            }
        }
        units
    }

    fn view_of(units: Vec<UnitSnapshot>) -> EntityView {
        let mut world = WorldSnapshot::empty(0, 1024.0, 1, 2);
        world.new_units = units;
        let mut view = EntityView::new();
        view.ingest(&world);
        view
    }

    #[test]
    fn test_transition_table_is_linear() {
        let mut phase = FormationPhase::Unsplit;
        let mut seen = vec![phase];
        while let Some(next) = phase.next() {
            phase = next;
            seen.push(phase);
        }
        assert_eq!(seen.len(), 5);
        assert_eq!(phase, FormationPhase::Released);
    }

    #[test]
    fn test_split_coordinate_picks_middle_gap() {
        let xs = [0.0, 6.0, 12.0, 18.0];
        assert_eq!(split_coordinate(&xs, -1.0, 19.0), Some(9.0));
        assert_eq!(split_coordinate(&[5.0, 5.0], 4.0, 6.0), None);
    }

    #[test]
    fn test_spread_axis_keeps_clearance() {
        let targets = spread_axis(&[(0.0, 5.0), (8.0, 5.0), (100.0, 5.0)], 10.0);
        assert_eq!(targets, vec![0.0, 20.0, 100.0]);
    }

    #[test]
    fn test_spread_axis_unordered_input() {
        let targets = spread_axis(&[(8.0, 5.0), (0.0, 5.0)], 10.0);
        assert_eq!(targets, vec![20.0, 0.0]);
    }

    #[test]
    fn test_cluster_overlapping() {
        let clusters = cluster_overlapping(&[(0.0, 10.0), (50.0, 60.0), (8.0, 20.0)]);
        assert_eq!(clusters, vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn test_split_creates_quadrants_and_solo_group() {
        let mut units = block(1, UnitCategory::GroundHeavy, Vec2::new(100.0, 100.0), 4);
        units.extend(block(100, UnitCategory::AirInterceptor, Vec2::new(300.0, 100.0), 3));
        let view = view_of(units);
        let mut registry = GroupRegistry::new();
        let mut queue = ActionQueue::new();
        let mut sequencer = FormationSequencer::new();

        let fired = sequencer.advance(
            &view,
            &GameConstants::default(),
            &TacticsConfig::default(),
            &mut registry,
            &mut queue,
        );
        assert!(fired);
        assert_eq!(sequencer.phase(), FormationPhase::HorizontallyAligned);
        assert_eq!(registry.len(), 5);

        let assigns = queue
            .iter(Priority::Ordinary)
            .filter(|q| matches!(q.command, PendingCommand::Assign { .. }))
            .count();
        assert_eq!(assigns, 5);
    }

    #[test]
    fn test_quadrant_rects_are_disjoint_on_units() {
        let units = block(1, UnitCategory::GroundLight, Vec2::new(10.0, 10.0), 5);
        let view = view_of(units.clone());
        let mut registry = GroupRegistry::new();
        let mut queue = ActionQueue::new();
        FormationSequencer::new().advance(
            &view,
            &GameConstants::default(),
            &TacticsConfig::default(),
            &mut registry,
            &mut queue,
        );

        let rects: Vec<Rect> = queue
            .iter(Priority::Ordinary)
            .filter_map(|q| match q.selection {
                Some(Selection::Rect { rect, .. }) => Some(rect),
                _ => None,
            })
            .collect();
        for unit in &units {
            let hits = rects.iter().filter(|r| r.contains(unit.position)).count();
            assert_eq!(hits, 1, "unit {} in {hits} rectangles", unit.id);
        }
    }

    #[test]
    fn test_advance_is_idempotent_until_settled() {
        let view = view_of(block(1, UnitCategory::GroundHeavy, Vec2::new(100.0, 100.0), 3));
        let mut registry = GroupRegistry::new();
        let mut queue = ActionQueue::new();
        let mut sequencer = FormationSequencer::new();
        let constants = GameConstants::default();
        let config = TacticsConfig::default();

        assert!(sequencer.advance(&view, &constants, &config, &mut registry, &mut queue));
        let queued = queue.len();
        assert!(!sequencer.advance(&view, &constants, &config, &mut registry, &mut queue));
        assert_eq!(queue.len(), queued);
        assert_eq!(sequencer.phase(), FormationPhase::HorizontallyAligned);
    }

    #[test]
    fn test_released_never_fires() {
        let view = view_of(Vec::new());
        let mut sequencer = FormationSequencer::released();
        assert!(!sequencer.advance(
            &view,
            &GameConstants::default(),
            &TacticsConfig::default(),
            &mut GroupRegistry::new(),
            &mut ActionQueue::new(),
        ));
    }
}
