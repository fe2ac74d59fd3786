//! Maneuver groups and their per-tick derived state.
//!
//! Membership is the `group` tag the host reports on each own unit. Every
//! derived field (centroid, radius, settlement) is recomputed from the entity
//! view on each refresh; only plan flags such as `is_compressing` or the
//! active path persist between ticks.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::action_queue::ActionQueue;
use crate::command::Rect;
use crate::config::TacticsConfig;
use crate::constants::GameConstants;
use crate::entity_view::{EntityView, Unit};
use crate::geometry::Segment;
use crate::math::Vec2;
use crate::units::{Domain, GroupTag, InstallationId, UnitCategory, UnitId};
use crate::world::{InstallationKind, Tick};

/// Nearest visible enemy of a group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyContact {
    /// Enemy unit id.
    pub unit: UnitId,
    /// Enemy position.
    pub position: Vec2,
    /// Enemy category.
    pub category: UnitCategory,
    /// Distance from the group centroid.
    pub distance: f64,
}

/// A maneuver group.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Unique tag.
    pub tag: GroupTag,
    /// Category the group was formed from.
    pub category: UnitCategory,
    /// Member unit ids.
    pub members: BTreeSet<UnitId>,
    /// Mean member position, the arena center when empty.
    pub centroid: Vec2,
    /// Largest member distance to the centroid.
    pub radius: f64,
    /// Speed of the slowest member.
    pub max_speed: f64,
    /// Largest base vision range of any member.
    pub vision_range: f64,
    /// Whether the group flies.
    pub is_aerial: bool,
    /// Whether the last command has fully taken effect.
    pub is_settled: bool,
    /// Nearest visible enemy.
    pub nearest_enemy: Option<EnemyContact>,
    /// Installation this group is sent to capture.
    pub assigned_installation: Option<InstallationId>,
    /// A compression scale is in flight.
    pub is_compressing: bool,
    /// Straight path of the last issued move.
    pub active_path: Option<Segment>,
    /// Impact point of the strike this group is evading.
    pub evasion: Option<Vec2>,
    /// Tick the last command for this group left the queue.
    pub last_command_tick: Option<Tick>,
    /// Summed member health.
    pub durability: u32,
    /// Share of members below the damaged health fraction.
    pub damaged_fraction: f64,
    /// Member bounding box.
    pub bounds: Option<Rect>,
}

impl Group {
    fn new(tag: GroupTag, category: UnitCategory, constants: &GameConstants) -> Self {
        let stats = constants.stats(category);
        Self {
            tag,
            category,
            members: BTreeSet::new(),
            centroid: Vec2::ZERO,
            radius: 0.0,
            max_speed: stats.speed,
            vision_range: stats.vision_range,
            is_aerial: category.is_aerial(),
            is_settled: false,
            nearest_enemy: None,
            assigned_installation: None,
            is_compressing: false,
            active_path: None,
            evasion: None,
            last_command_tick: None,
            durability: 0,
            damaged_fraction: 0.0,
            bounds: None,
        }
    }

    /// Movement domain.
    #[must_use]
    pub fn domain(&self) -> Domain {
        if self.is_aerial {
            Domain::Air
        } else {
            Domain::Ground
        }
    }

    /// Whether the group currently has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn recompute(
        &mut self,
        view: &EntityView,
        constants: &GameConstants,
        config: &TacticsConfig,
        queue: &ActionQueue,
    ) {
        let tick = view.tick();
        let members: Vec<&Unit> = view.members(self.tag).collect();

        self.members = members.iter().map(|u| u.id).collect();
        self.centroid = view.centroid(members.iter().copied());
        self.radius = members
            .iter()
            .map(|u| u.position.distance(self.centroid))
            .fold(0.0, f64::max);
        self.bounds = Rect::bounding(members.iter().map(|u| u.position));

        let category_stats = constants.stats(self.category);
        self.max_speed = members
            .iter()
            .map(|u| constants.stats(u.category).speed)
            .reduce(f64::min)
            .unwrap_or(category_stats.speed);
        self.vision_range = members
            .iter()
            .map(|u| constants.stats(u.category).vision_range)
            .reduce(f64::max)
            .unwrap_or(category_stats.vision_range);
        self.is_aerial = members
            .first()
            .map_or(self.category.is_aerial(), |u| u.category.is_aerial());

        self.durability = members.iter().map(|u| u.health).sum();
        self.damaged_fraction = if members.is_empty() {
            0.0
        } else {
            let damaged = members
                .iter()
                .filter(|u| u.health_fraction() < config.damaged_health_fraction)
                .count();
            damaged as f64 / members.len() as f64
        };

        self.nearest_enemy = view
            .enemy_units()
            .map(|e| EnemyContact {
                unit: e.id,
                position: e.position,
                category: e.category,
                distance: e.position.distance(self.centroid),
            })
            .reduce(|best, c| if c.distance < best.distance { c } else { best });

        let threshold = Tick::from(config.settle_ticks);
        let members_stable = members
            .iter()
            .all(|u| tick.saturating_sub(u.last_change_tick) > threshold);
        let command_applied = self
            .last_command_tick
            .map_or(true, |t| tick.saturating_sub(t) > threshold);
        let settled = members_stable && command_applied && !queue.references(self.tag);

        if settled && !self.is_settled {
            debug!(tick, group = self.tag, "Group settled");
        }
        self.is_settled = settled;
        if settled {
            self.is_compressing = false;
            self.active_path = None;
        }
    }
}

/// All groups of the controlled player.
#[derive(Debug, Clone)]
pub struct GroupRegistry {
    groups: BTreeMap<GroupTag, Group>,
    next_tag: GroupTag,
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupRegistry {
    /// Empty registry. Tags start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            groups: BTreeMap::new(),
            next_tag: 1,
        }
    }

    /// Register a new, still empty group and return its tag.
    pub fn create(&mut self, category: UnitCategory, constants: &GameConstants) -> GroupTag {
        let tag = self.next_tag;
        self.next_tag += 1;
        self.groups.insert(tag, Group::new(tag, category, constants));
        info!(group = tag, ?category, "Group created");
        tag
    }

    /// Register groups tagged by the host that the registry does not know.
    pub fn adopt_untracked(&mut self, view: &EntityView, constants: &GameConstants) {
        let mut found: BTreeMap<GroupTag, BTreeMap<UnitCategory, usize>> = BTreeMap::new();
        for unit in view.own_units() {
            if let Some(tag) = unit.group {
                if !self.groups.contains_key(&tag) {
                    *found.entry(tag).or_default().entry(unit.category).or_default() += 1;
                }
            }
        }
        for (tag, counts) in found {
            let category = counts
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
                .map_or(UnitCategory::GroundHeavy, |(c, _)| *c);
            self.groups.insert(tag, Group::new(tag, category, constants));
            self.next_tag = self.next_tag.max(tag + 1);
            info!(group = tag, ?category, "Adopted host group");
        }
    }

    /// Recompute every group from the view.
    pub fn refresh(
        &mut self,
        view: &EntityView,
        constants: &GameConstants,
        config: &TacticsConfig,
        queue: &ActionQueue,
    ) {
        for group in self.groups.values_mut() {
            group.recompute(view, constants, config, queue);
        }
        self.assign_installations(view, constants);
    }

    /// Remove settled empty groups. Returns the removed tags.
    pub fn prune(&mut self) -> Vec<GroupTag> {
        let gone: Vec<GroupTag> = self
            .groups
            .values()
            .filter(|g| g.is_empty() && g.is_settled)
            .map(|g| g.tag)
            .collect();
        for tag in &gone {
            self.groups.remove(tag);
            debug!(group = tag, "Pruned empty group");
        }
        gone
    }

    /// Whether every group is settled.
    #[must_use]
    pub fn all_settled(&self) -> bool {
        self.groups.values().all(|g| g.is_settled)
    }

    /// Record that a command for `tag` left the queue.
    pub fn note_command(&mut self, tag: GroupTag, tick: Tick) {
        if let Some(group) = self.groups.get_mut(&tag) {
            group.last_command_tick = Some(tick);
            group.is_settled = false;
        }
    }

    /// Look up a group.
    #[must_use]
    pub fn get(&self, tag: GroupTag) -> Option<&Group> {
        self.groups.get(&tag)
    }

    /// Look up a group mutably.
    pub fn get_mut(&mut self, tag: GroupTag) -> Option<&mut Group> {
        self.groups.get_mut(&tag)
    }

    /// All groups in tag order.
    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// All groups in tag order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Group> {
        self.groups.values_mut()
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no group exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The non-empty support group, if any.
    #[must_use]
    pub fn support_group(&self) -> Option<&Group> {
        self.groups
            .values()
            .find(|g| g.category == UnitCategory::GroundSupport && !g.is_empty())
    }

    /// Give each non-own installation to the nearest free ground group.
    fn assign_installations(&mut self, view: &EntityView, constants: &GameConstants) {
        for group in self.groups.values_mut() {
            group.assigned_installation = None;
        }

        let nearest_ground = |groups: &BTreeMap<GroupTag, Group>, point: Vec2, free_only: bool| {
            groups
                .values()
                .filter(|g| !g.is_aerial && !g.is_empty())
                .filter(|g| !free_only || g.assigned_installation.is_none())
                .map(|g| (g.tag, g.centroid.distance(point)))
                .reduce(|best, c| if c.1 < best.1 { c } else { best })
        };

        let me = view.me().id;
        let mut targets: Vec<(bool, f64, InstallationId, Vec2)> = view
            .installations()
            .iter()
            .filter(|i| i.owner != Some(me))
            .map(|i| {
                let center = i.center(constants.installation_size);
                let distance =
                    nearest_ground(&self.groups, center, false).map_or(f64::INFINITY, |(_, d)| d);
                (i.kind != InstallationKind::Factory, distance, i.id, center)
            })
            .collect();
        targets.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)).then(a.2.cmp(&b.2)));

        for (_, _, id, center) in targets {
            if let Some((tag, _)) = nearest_ground(&self.groups, center, true) {
                if let Some(group) = self.groups.get_mut(&tag) {
                    group.assigned_installation = Some(id);
                }
            }
        }
    }
}
