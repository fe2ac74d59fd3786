//! Mock host arena.
//!
//! A small kinematic simulation that speaks the controller's command
//! vocabulary: per-player selections and group tags, straight-line movement
//! towards move/scale/rotate targets, range-based attrition, delayed area
//! strikes, installation capture and factory output. Each player receives
//! fog-of-war snapshots as deltas against what it was told before.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use swarm_core::command::{Command, Rect};
use swarm_core::constants::GameConstants;
use swarm_core::math::Vec2;
use swarm_core::units::{GroupTag, PlayerId, UnitCategory, UnitId};
use swarm_core::visibility::sees_within;
use swarm_core::world::{
    CellGrid, Installation, InstallationKind, PlayerState, StrikeAnnouncement, Terrain, Tick,
    UnitSnapshot, UnitUpdate, Weather, WorldSnapshot,
};
use tracing::{debug, info};

use crate::scenario::{ArenaRules, Scenario};

/// Player ids in scenario order.
pub const PLAYER_IDS: [PlayerId; 2] = [1, 2];

/// Counters kept per player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideStats {
    /// Commands received.
    pub commands: u32,
    /// Commands the arena refused.
    pub rejected: u32,
    /// Strikes launched.
    pub strikes: u32,
    /// Units produced by factories.
    pub units_produced: u32,
    /// Units destroyed.
    pub units_lost: u32,
}

/// Whether the arena carried out a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Applied.
    Accepted,
    /// Refused, with the reason.
    Rejected(&'static str),
}

#[derive(Debug, Clone, Copy)]
struct Order {
    target: Vec2,
    max_speed: Option<f64>,
}

#[derive(Debug, Clone)]
struct ArenaUnit {
    id: UnitId,
    owner: PlayerId,
    category: UnitCategory,
    position: Vec2,
    health: u32,
    max_health: u32,
    group: Option<GroupTag>,
    order: Option<Order>,
    next_attack: Tick,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Reported {
    position: Vec2,
    health: u32,
    group: Option<GroupTag>,
}

#[derive(Debug, Clone, Copy)]
struct PendingStrike {
    point: Vec2,
    caster: UnitId,
    detonates_at: Tick,
}

#[derive(Debug, Clone)]
struct Side {
    id: PlayerId,
    selection: BTreeSet<UnitId>,
    action_cooldown: u32,
    strike_cooldown: u32,
    pending_strike: Option<PendingStrike>,
    reported: BTreeMap<UnitId, Reported>,
    grids_sent: bool,
    stats: SideStats,
}

impl Side {
    fn new(id: PlayerId) -> Self {
        Self {
            id,
            selection: BTreeSet::new(),
            action_cooldown: 0,
            strike_cooldown: 0,
            pending_strike: None,
            reported: BTreeMap::new(),
            grids_sent: false,
            stats: SideStats::default(),
        }
    }

    fn state(&self) -> PlayerState {
        PlayerState {
            id: self.id,
            remaining_action_cooldown: self.action_cooldown,
            remaining_strike_cooldown: self.strike_cooldown,
            next_strike: self.pending_strike.map(|s| StrikeAnnouncement {
                point: s.point,
                caster: s.caster,
            }),
        }
    }
}

#[derive(Debug, Clone)]
struct Site {
    installation: Installation,
    capture: Option<(PlayerId, u32)>,
    next_spawn: Tick,
    produced: u32,
}

/// The mock host.
#[derive(Debug, Clone)]
pub struct Arena {
    tick: Tick,
    width: f64,
    height: f64,
    rules: ArenaRules,
    constants: GameConstants,
    units: BTreeMap<UnitId, ArenaUnit>,
    sides: [Side; 2],
    sites: Vec<Site>,
    terrain: CellGrid<Terrain>,
    weather: CellGrid<Weather>,
    next_unit_id: UnitId,
}

impl Arena {
    /// Lay out a scenario at tick 0.
    #[must_use]
    pub fn from_scenario(scenario: &Scenario) -> Self {
        let constants = scenario.game_constants();
        let cell = constants.cell_size.max(1.0);
        let columns = (scenario.width / cell).ceil() as usize;
        let rows = (scenario.height / cell).ceil() as usize;

        let mut terrain = CellGrid::filled(columns, rows, Terrain::Plain);
        for patch in &scenario.terrain {
            for c in patch.column..patch.column + patch.columns {
                for r in patch.row..patch.row + patch.rows {
                    terrain.set(c, r, patch.terrain);
                }
            }
        }
        let mut weather = CellGrid::filled(columns, rows, Weather::Clear);
        for patch in &scenario.weather {
            for c in patch.column..patch.column + patch.columns {
                for r in patch.row..patch.row + patch.rows {
                    weather.set(c, r, patch.weather);
                }
            }
        }

        let mut arena = Self {
            tick: 0,
            width: scenario.width,
            height: scenario.height,
            rules: scenario.rules.clone(),
            constants,
            units: BTreeMap::new(),
            sides: [Side::new(PLAYER_IDS[0]), Side::new(PLAYER_IDS[1])],
            sites: Vec::new(),
            terrain,
            weather,
            next_unit_id: 1,
        };
        for (player, setup) in PLAYER_IDS.iter().zip(&scenario.players) {
            for placement in &setup.units {
                for (x, y) in placement.positions() {
                    arena.spawn(*player, placement.category, Vec2::new(x, y));
                }
            }
        }
        arena.sites = scenario
            .installations
            .iter()
            .enumerate()
            .map(|(i, placement)| Site {
                installation: Installation {
                    id: i as u64 + 1,
                    owner: placement.owner.and_then(|o| PLAYER_IDS.get(o).copied()),
                    kind: placement.kind,
                    top_left: Vec2::new(placement.x, placement.y),
                    production: None,
                },
                capture: None,
                next_spawn: 0,
                produced: 0,
            })
            .collect();
        arena
    }

    fn spawn(&mut self, owner: PlayerId, category: UnitCategory, position: Vec2) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id += 1;
        let max_health = self.constants.stats(category).max_durability;
        self.units.insert(
            id,
            ArenaUnit {
                id,
                owner,
                category,
                position,
                health: max_health,
                max_health,
                group: None,
                order: None,
                next_attack: 0,
            },
        );
        id
    }

    /// Current tick.
    #[must_use]
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Constants the arena plays by.
    #[must_use]
    pub fn constants(&self) -> &GameConstants {
        &self.constants
    }

    fn side_index(player: PlayerId) -> Option<usize> {
        PLAYER_IDS.iter().position(|p| *p == player)
    }

    /// Counters of `player`.
    #[must_use]
    pub fn stats(&self, player: PlayerId) -> Option<&SideStats> {
        Self::side_index(player).map(|i| &self.sides[i].stats)
    }

    /// Living units of `player`.
    #[must_use]
    pub fn alive_units(&self, player: PlayerId) -> usize {
        self.units.values().filter(|u| u.owner == player).count()
    }

    /// Installations owned by `player`.
    #[must_use]
    pub fn installations_owned(&self, player: PlayerId) -> usize {
        self.sites
            .iter()
            .filter(|s| s.installation.owner == Some(player))
            .count()
    }

    /// Position of a living unit.
    #[must_use]
    pub fn unit_position(&self, id: UnitId) -> Option<Vec2> {
        self.units.get(&id).map(|u| u.position)
    }

    /// Health of a living unit.
    #[must_use]
    pub fn unit_health(&self, id: UnitId) -> Option<u32> {
        self.units.get(&id).map(|u| u.health)
    }

    /// Group tag of a living unit.
    #[must_use]
    pub fn unit_group(&self, id: UnitId) -> Option<GroupTag> {
        self.units.get(&id).and_then(|u| u.group)
    }

    /// The only player with units left, once the other is wiped out.
    #[must_use]
    pub fn survivor(&self) -> Option<PlayerId> {
        let alive: Vec<PlayerId> = PLAYER_IDS
            .into_iter()
            .filter(|p| self.alive_units(*p) > 0)
            .collect();
        match alive.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    fn sees(&self, viewer: &ArenaUnit, point: Vec2) -> bool {
        let cell = self.constants.cell_size;
        let factor = if viewer.category.is_aerial() {
            self.constants
                .vision
                .weather(self.weather.at_position(viewer.position, cell))
        } else {
            self.constants
                .vision
                .terrain(self.terrain.at_position(viewer.position, cell))
        };
        let range = self.constants.stats(viewer.category).vision_range * factor;
        sees_within(viewer.position, point, range, 0.0)
    }

    /// Fog-of-war snapshot for `player`, as a delta against the previous one.
    ///
    /// Units that vanished from sight or died are reported once with health 0.
    pub fn snapshot_for(&mut self, player: PlayerId) -> WorldSnapshot {
        let Some(index) = Self::side_index(player) else {
            return WorldSnapshot::empty(self.tick, self.width, player, 0);
        };
        let viewers: Vec<&ArenaUnit> = self.units.values().filter(|u| u.owner == player).collect();
        let visible: BTreeMap<UnitId, &ArenaUnit> = self
            .units
            .values()
            .filter(|u| u.owner == player || viewers.iter().any(|v| self.sees(v, u.position)))
            .map(|u| (u.id, u))
            .collect();

        let mut new_units = Vec::new();
        let mut unit_updates = Vec::new();
        let mut reported = std::mem::take(&mut self.sides[index].reported);

        for (id, unit) in &visible {
            let group = if unit.owner == player { unit.group } else { None };
            let now = Reported {
                position: unit.position,
                health: unit.health,
                group,
            };
            match reported.insert(*id, now) {
                None => new_units.push(UnitSnapshot {
                    id: *id,
                    owner: unit.owner,
                    category: unit.category,
                    position: unit.position,
                    health: unit.health,
                    max_health: unit.max_health,
                    group,
                }),
                Some(before) if before != now => unit_updates.push(UnitUpdate {
                    id: *id,
                    position: now.position,
                    health: now.health,
                    group,
                }),
                Some(_) => {}
            }
        }
        let gone: Vec<UnitId> = reported
            .keys()
            .filter(|id| !visible.contains_key(id))
            .copied()
            .collect();
        for id in gone {
            if let Some(last) = reported.remove(&id) {
                unit_updates.push(UnitUpdate {
                    id,
                    position: last.position,
                    health: 0,
                    group: last.group,
                });
            }
        }

        let other = 1 - index;
        let side = &mut self.sides[index];
        side.reported = reported;
        let (terrain, weather) = if side.grids_sent {
            (None, None)
        } else {
            side.grids_sent = true;
            (Some(self.terrain.clone()), Some(self.weather.clone()))
        };

        WorldSnapshot {
            tick: self.tick,
            width: self.width,
            height: self.height,
            me: self.sides[index].state(),
            opponent: self.sides[other].state(),
            new_units,
            unit_updates,
            installations: self.sites.iter().map(|s| s.installation.clone()).collect(),
            terrain,
            weather,
        }
    }

    /// Carry out `command` for `player`.
    pub fn apply(&mut self, player: PlayerId, command: &Command) -> CommandOutcome {
        let Some(index) = Self::side_index(player) else {
            return CommandOutcome::Rejected("unknown player");
        };
        if self.sides[index].action_cooldown > 0 {
            return self.reject(index, "action cooldown");
        }
        self.sides[index].action_cooldown = self.rules.action_cooldown;
        self.sides[index].stats.commands += 1;

        match *command {
            Command::SelectRect {
                left,
                top,
                right,
                bottom,
                category,
            } => {
                let rect = Rect::new(left, top, right, bottom);
                self.sides[index].selection = self
                    .units
                    .values()
                    .filter(|u| u.owner == player && rect.contains(u.position))
                    .filter(|u| category.map_or(true, |c| c == u.category))
                    .map(|u| u.id)
                    .collect();
            }
            Command::SelectGroup { group } => {
                self.sides[index].selection = self
                    .units
                    .values()
                    .filter(|u| u.owner == player && u.group == Some(group))
                    .map(|u| u.id)
                    .collect();
            }
            Command::Assign { group } => {
                for id in &self.sides[index].selection {
                    if let Some(unit) = self.units.get_mut(id) {
                        unit.group = Some(group);
                    }
                }
            }
            Command::Deselect { group } => {
                let units = &self.units;
                self.sides[index]
                    .selection
                    .retain(|id| units.get(id).map_or(false, |u| u.group != Some(group)));
            }
            Command::Move { dx, dy, max_speed } => {
                self.order_selection(index, max_speed, |p| p + Vec2::new(dx, dy));
            }
            Command::Scale { x, y, factor } => {
                let about = Vec2::new(x, y);
                self.order_selection(index, None, |p| about + (p - about).scale(factor));
            }
            Command::Rotate { x, y, angle, .. } => {
                let about = Vec2::new(x, y);
                self.order_selection(index, None, |p| about + (p - about).rotate(angle));
            }
            Command::StartProduction {
                installation,
                category,
            } => {
                let tick = self.tick;
                let interval = self.rules.production_interval;
                let Some(site_index) = self.sites.iter().position(|s| {
                    s.installation.id == installation
                        && s.installation.owner == Some(player)
                        && s.installation.kind == InstallationKind::Factory
                }) else {
                    return self.reject(index, "not an own factory");
                };
                let site = &mut self.sites[site_index];
                site.installation.production = Some(category);
                site.next_spawn = tick + interval;
            }
            Command::AreaStrike { x, y, caster } => {
                let point = Vec2::new(x, y);
                let side = &self.sides[index];
                if side.strike_cooldown > 0 || side.pending_strike.is_some() {
                    return self.reject(index, "strike not ready");
                }
                let spotted = self
                    .units
                    .get(&caster)
                    .is_some_and(|u| u.owner == player && self.sees(u, point));
                if !spotted {
                    return self.reject(index, "caster cannot see the point");
                }
                let centers = self
                    .sites
                    .iter()
                    .filter(|s| {
                        s.installation.kind == InstallationKind::ControlCenter
                            && s.installation.owner == Some(player)
                    })
                    .count();
                let strike = self.constants.strike;
                let side = &mut self.sides[index];
                side.pending_strike = Some(PendingStrike {
                    point,
                    caster,
                    detonates_at: self.tick + u64::from(strike.delay),
                });
                side.strike_cooldown = strike.cooldown_for(centers);
                side.stats.strikes += 1;
                info!(tick = self.tick, player, x, y, "Strike launched");
            }
        }
        CommandOutcome::Accepted
    }

    fn reject(&mut self, index: usize, reason: &'static str) -> CommandOutcome {
        self.sides[index].stats.rejected += 1;
        debug!(tick = self.tick, player = self.sides[index].id, reason, "Command rejected");
        CommandOutcome::Rejected(reason)
    }

    fn order_selection(&mut self, index: usize, max_speed: Option<f64>, target: impl Fn(Vec2) -> Vec2) {
        for id in &self.sides[index].selection {
            if let Some(unit) = self.units.get_mut(id) {
                unit.order = Some(Order {
                    target: target(unit.position),
                    max_speed,
                });
            }
        }
    }

    /// Advance the arena by one tick.
    pub fn step(&mut self) {
        self.move_units();
        self.resolve_attacks();
        self.detonate_strikes();
        self.remove_dead();
        self.capture_installations();
        self.produce();
        for side in &mut self.sides {
            side.action_cooldown = side.action_cooldown.saturating_sub(1);
            side.strike_cooldown = side.strike_cooldown.saturating_sub(1);
        }
        self.tick += 1;
    }

    fn move_units(&mut self) {
        let (width, height) = (self.width, self.height);
        for unit in self.units.values_mut() {
            let Some(order) = unit.order else {
                continue;
            };
            let speed = self.constants.stats(unit.category).speed;
            let speed = order.max_speed.map_or(speed, |cap| speed.min(cap));
            let remaining = order.target - unit.position;
            let next = if remaining.length() <= speed {
                unit.order = None;
                order.target
            } else {
                unit.position + remaining.normalize().scale(speed)
            };
            unit.position = Vec2::new(next.x.clamp(0.0, width), next.y.clamp(0.0, height));
        }
    }

    fn resolve_attacks(&mut self) {
        let tick = self.tick;
        let mut hits: Vec<(UnitId, UnitId, u32)> = Vec::new();
        for attacker in self.units.values().filter(|u| u.next_attack <= tick) {
            let stats = self.constants.stats(attacker.category);
            let target = self
                .units
                .values()
                .filter(|t| t.owner != attacker.owner && stats.damage_against(t.category) > 0.0)
                .map(|t| (t, t.position.distance(attacker.position)))
                .filter(|(t, d)| *d <= stats.attack_range_against(t.category))
                .min_by(|a, b| a.1.total_cmp(&b.1));
            if let Some((target, _)) = target {
                let damage = (stats.damage_against(target.category) / self.rules.damage_divisor)
                    .round()
                    .max(1.0) as u32;
                hits.push((attacker.id, target.id, damage));
            }
        }
        for (attacker, target, damage) in hits {
            if let Some(unit) = self.units.get_mut(&target) {
                unit.health = unit.health.saturating_sub(damage);
            }
            if let Some(unit) = self.units.get_mut(&attacker) {
                unit.next_attack = tick + self.rules.attack_interval;
            }
        }
    }

    fn detonate_strikes(&mut self) {
        let radius = self.constants.strike.radius;
        for index in 0..self.sides.len() {
            let Some(strike) = self.sides[index].pending_strike else {
                continue;
            };
            if strike.detonates_at > self.tick {
                continue;
            }
            self.sides[index].pending_strike = None;
            let guided = self
                .units
                .get(&strike.caster)
                .is_some_and(|u| self.sees(u, strike.point));
            if !guided {
                debug!(tick = self.tick, player = self.sides[index].id, "Strike lost its guide");
                continue;
            }
            for unit in self.units.values_mut() {
                let distance = unit.position.distance(strike.point);
                if distance < radius {
                    let damage = (99.0 * (1.0 - distance / radius)).round() as u32;
                    unit.health = unit.health.saturating_sub(damage);
                }
            }
            info!(tick = self.tick, player = self.sides[index].id, "Strike detonated");
        }
    }

    fn remove_dead(&mut self) {
        let dead: Vec<(UnitId, PlayerId)> = self
            .units
            .values()
            .filter(|u| u.health == 0)
            .map(|u| (u.id, u.owner))
            .collect();
        for (id, owner) in dead {
            self.units.remove(&id);
            if let Some(index) = Self::side_index(owner) {
                self.sides[index].stats.units_lost += 1;
            }
            for side in &mut self.sides {
                side.selection.remove(&id);
            }
        }
    }

    fn capture_installations(&mut self) {
        let size = self.constants.installation_size;
        let needed = self.rules.capture_ticks;
        for site in &mut self.sites {
            let top_left = site.installation.top_left;
            let footprint = Rect::new(top_left.x, top_left.y, top_left.x + size, top_left.y + size);
            let present: BTreeSet<PlayerId> = self
                .units
                .values()
                .filter(|u| !u.category.is_aerial() && footprint.contains(u.position))
                .map(|u| u.owner)
                .collect();
            let mut present = present.into_iter();
            let sole = match (present.next(), present.next()) {
                (Some(player), None) => Some(player),
                _ => None,
            };
            let Some(player) = sole.filter(|p| site.installation.owner != Some(*p)) else {
                site.capture = None;
                continue;
            };
            let progress = match site.capture {
                Some((p, n)) if p == player => n + 1,
                _ => 1,
            };
            if progress >= needed {
                site.installation.owner = Some(player);
                site.installation.production = None;
                site.capture = None;
                info!(tick = self.tick, player, installation = site.installation.id, "Installation captured");
            } else {
                site.capture = Some((player, progress));
            }
        }
    }

    fn produce(&mut self) {
        let size = self.constants.installation_size;
        let interval = self.rules.production_interval;
        let mut spawns = Vec::new();
        for site in &mut self.sites {
            let (Some(owner), Some(category)) = (site.installation.owner, site.installation.production)
            else {
                continue;
            };
            if site.installation.kind != InstallationKind::Factory || self.tick < site.next_spawn {
                continue;
            }
            let n = site.produced % 64;
            let offset = Vec2::new(f64::from(n % 8) * 4.0 - 14.0, f64::from(n / 8) * 4.0 - 14.0);
            spawns.push((owner, category, site.installation.center(size) + offset));
            site.produced += 1;
            site.next_spawn = self.tick + interval;
        }
        for (owner, category, position) in spawns {
            self.spawn(owner, category, position);
            if let Some(index) = Self::side_index(owner) {
                self.sides[index].stats.units_produced += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{InstallationPlacement, PlayerSetup, UnitPlacement};

    fn duel(first: Vec<UnitPlacement>, second: Vec<UnitPlacement>) -> Scenario {
        Scenario {
            name: "test".into(),
            description: String::new(),
            width: 512.0,
            height: 512.0,
            max_ticks: 100,
            players: vec![
                PlayerSetup {
                    name: "a".into(),
                    units: first,
                    config: None,
                },
                PlayerSetup {
                    name: "b".into(),
                    units: second,
                    config: None,
                },
            ],
            installations: Vec::new(),
            terrain: Vec::new(),
            weather: Vec::new(),
            rules: ArenaRules::default(),
            constants: None,
        }
    }

    fn heavy(x: f64, y: f64, count: u32) -> UnitPlacement {
        UnitPlacement::new(UnitCategory::GroundHeavy, x, y, count)
    }

    #[test]
    fn test_first_snapshot_hides_distant_enemies() {
        let mut arena = Arena::from_scenario(&duel(vec![heavy(10.0, 10.0, 3)], vec![heavy(400.0, 400.0, 3)]));
        let world = arena.snapshot_for(1);
        assert_eq!(world.new_units.len(), 3);
        assert!(world.new_units.iter().all(|u| u.owner == 1));
        assert!(world.terrain.is_some());
        assert!(arena.snapshot_for(1).terrain.is_none());
    }

    #[test]
    fn test_snapshot_reports_only_changes() {
        let mut arena = Arena::from_scenario(&duel(vec![heavy(10.0, 10.0, 2)], vec![heavy(400.0, 400.0, 1)]));
        arena.snapshot_for(1);
        let quiet = arena.snapshot_for(1);
        assert!(quiet.new_units.is_empty() && quiet.unit_updates.is_empty());

        arena.apply(1, &Command::SelectGroup { group: 9 });
        arena.apply(
            1,
            &Command::SelectRect {
                left: 0.0,
                top: 0.0,
                right: 12.0,
                bottom: 12.0,
                category: None,
            },
        );
        arena.apply(1, &Command::Assign { group: 4 });
        let tagged = arena.snapshot_for(1);
        assert_eq!(tagged.unit_updates.len(), 1);
        assert_eq!(tagged.unit_updates[0].group, Some(4));
    }

    #[test]
    fn test_move_is_speed_capped() {
        let mut arena = Arena::from_scenario(&duel(vec![heavy(100.0, 100.0, 1)], vec![heavy(400.0, 400.0, 1)]));
        arena.apply(
            1,
            &Command::SelectRect {
                left: 90.0,
                top: 90.0,
                right: 110.0,
                bottom: 110.0,
                category: Some(UnitCategory::GroundHeavy),
            },
        );
        arena.apply(
            1,
            &Command::Move {
                dx: 10.0,
                dy: 0.0,
                max_speed: Some(0.25),
            },
        );
        arena.step();
        let position = arena.unit_position(1).unwrap();
        assert!((position.x - 100.25).abs() < 1e-9);
    }

    #[test]
    fn test_scale_moves_towards_point() {
        let mut arena = Arena::from_scenario(&duel(vec![heavy(100.0, 100.0, 1)], vec![heavy(400.0, 400.0, 1)]));
        arena.apply(1, &Command::SelectRect { left: 0.0, top: 0.0, right: 200.0, bottom: 200.0, category: None });
        arena.apply(1, &Command::Scale { x: 110.0, y: 100.0, factor: 0.0 });
        for _ in 0..40 {
            arena.step();
        }
        assert_eq!(arena.unit_position(1), Some(Vec2::new(110.0, 100.0)));
    }

    #[test]
    fn test_action_cooldown_rejects() {
        let mut scenario = duel(vec![heavy(10.0, 10.0, 1)], vec![heavy(400.0, 400.0, 1)]);
        scenario.rules.action_cooldown = 3;
        let mut arena = Arena::from_scenario(&scenario);
        assert_eq!(arena.apply(1, &Command::SelectGroup { group: 1 }), CommandOutcome::Accepted);
        assert!(matches!(
            arena.apply(1, &Command::SelectGroup { group: 1 }),
            CommandOutcome::Rejected(_)
        ));
        assert_eq!(arena.snapshot_for(1).me.remaining_action_cooldown, 3);
        assert_eq!(arena.stats(1).unwrap().rejected, 1);
    }

    #[test]
    fn test_adjacent_enemies_wear_each_other_down() {
        let mut arena = Arena::from_scenario(&duel(vec![heavy(100.0, 100.0, 1)], vec![heavy(110.0, 100.0, 1)]));
        arena.step();
        let world = arena.snapshot_for(1);
        let enemy = world.new_units.iter().find(|u| u.owner == 2).unwrap();
        assert_eq!(enemy.health, 90);
    }

    #[test]
    fn test_vanished_enemy_reported_dead() {
        let mut arena = Arena::from_scenario(&duel(vec![heavy(100.0, 100.0, 1)], vec![heavy(150.0, 100.0, 1)]));
        let first = arena.snapshot_for(1);
        assert_eq!(first.new_units.len(), 2);

        arena.apply(2, &Command::SelectRect { left: 140.0, top: 90.0, right: 160.0, bottom: 110.0, category: None });
        arena.apply(2, &Command::Move { dx: 300.0, dy: 0.0, max_speed: None });
        for _ in 0..100 {
            arena.step();
        }
        let later = arena.snapshot_for(1);
        assert!(later.unit_updates.iter().any(|u| u.id == 2 && u.health == 0));
    }

    #[test]
    fn test_strike_needs_sight_and_lands_after_delay() {
        let mut arena = Arena::from_scenario(&duel(vec![heavy(100.0, 100.0, 1)], vec![heavy(160.0, 100.0, 5)]));
        assert!(matches!(
            arena.apply(1, &Command::AreaStrike { x: 400.0, y: 400.0, caster: 1 }),
            CommandOutcome::Rejected(_)
        ));
        assert_eq!(
            arena.apply(1, &Command::AreaStrike { x: 165.0, y: 100.0, caster: 1 }),
            CommandOutcome::Accepted
        );
        assert!(arena.snapshot_for(2).opponent.next_strike.is_some());
        for _ in 0..=arena.constants().strike.delay {
            arena.step();
        }
        assert!(arena.snapshot_for(2).opponent.next_strike.is_none());
        assert!(arena.unit_health(2).is_some_and(|h| h < 100));
        assert_eq!(arena.unit_health(1), Some(100));
        assert_eq!(arena.stats(1).unwrap().strikes, 1);
    }

    #[test]
    fn test_capture_then_produce() {
        let mut scenario = duel(vec![heavy(210.0, 210.0, 1)], vec![heavy(480.0, 480.0, 1)]);
        scenario.installations.push(InstallationPlacement {
            kind: InstallationKind::Factory,
            x: 200.0,
            y: 200.0,
            owner: None,
        });
        scenario.rules.capture_ticks = 5;
        let mut arena = Arena::from_scenario(&scenario);
        for _ in 0..5 {
            arena.step();
        }
        assert_eq!(arena.installations_owned(1), 1);

        assert_eq!(
            arena.apply(1, &Command::StartProduction { installation: 1, category: UnitCategory::AirTransport }),
            CommandOutcome::Accepted
        );
        for _ in 0..=scenario.rules.production_interval {
            arena.step();
        }
        assert_eq!(arena.alive_units(1), 2);
        assert_eq!(arena.stats(1).unwrap().units_produced, 1);
        assert!(matches!(
            arena.apply(2, &Command::StartProduction { installation: 1, category: UnitCategory::GroundLight }),
            CommandOutcome::Rejected(_)
        ));
    }
}
