//! Stable entity cache built from per-tick snapshots.
//!
//! The host only sends deltas, so the view keeps every known unit between
//! ticks and records when each own unit last moved or changed group. The
//! group registry reads those change ticks to detect settlement.

use std::collections::BTreeMap;

use tracing::warn;

use crate::math::{self, Vec2};
use crate::units::{GroupTag, PlayerId, UnitCategory, UnitId};
use crate::world::{
    CellGrid, Installation, InstallationKind, PlayerState, Terrain, Tick, Weather, WorldSnapshot,
};

/// A known unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    /// Unit id.
    pub id: UnitId,
    /// Owning player.
    pub owner: PlayerId,
    /// Category.
    pub category: UnitCategory,
    /// Last reported position.
    pub position: Vec2,
    /// Last reported durability.
    pub health: u32,
    /// Maximum durability.
    pub max_health: u32,
    /// Group tag (own units).
    pub group: Option<GroupTag>,
    /// Tick of the last position or group change.
    pub last_change_tick: Tick,
}

impl Unit {
    /// Health as a fraction of max health.
    #[must_use]
    pub fn health_fraction(&self) -> f64 {
        if self.max_health == 0 {
            return 0.0;
        }
        f64::from(self.health) / f64::from(self.max_health)
    }
}

/// Queryable view of everything the controller knows.
#[derive(Debug, Clone)]
pub struct EntityView {
    tick: Tick,
    width: f64,
    height: f64,
    me: PlayerState,
    opponent: PlayerState,
    units: BTreeMap<UnitId, Unit>,
    installations: Vec<Installation>,
    terrain: Option<CellGrid<Terrain>>,
    weather: Option<CellGrid<Weather>>,
}

impl Default for EntityView {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityView {
    /// Empty view.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick: 0,
            width: 0.0,
            height: 0.0,
            me: PlayerState::default(),
            opponent: PlayerState::default(),
            units: BTreeMap::new(),
            installations: Vec::new(),
            terrain: None,
            weather: None,
        }
    }

    /// Fold one tick's snapshot into the view.
    pub fn ingest(&mut self, snapshot: &WorldSnapshot) {
        let tick = snapshot.tick;
        self.tick = tick;
        self.width = snapshot.width;
        self.height = snapshot.height;
        self.me = snapshot.me.clone();
        self.opponent = snapshot.opponent.clone();

        for seen in &snapshot.new_units {
            self.units.insert(
                seen.id,
                Unit {
                    id: seen.id,
                    owner: seen.owner,
                    category: seen.category,
                    position: seen.position,
                    health: seen.health,
                    max_health: seen.max_health,
                    group: seen.group,
                    last_change_tick: tick,
                },
            );
        }

        for update in &snapshot.unit_updates {
            if update.health == 0 {
                self.units.remove(&update.id);
                continue;
            }
            let Some(unit) = self.units.get_mut(&update.id) else {
                warn!(tick, unit = update.id, "Update for unknown unit ignored");
                continue;
            };
            if unit.position != update.position || unit.group != update.group {
                unit.position = update.position;
                unit.group = update.group;
                unit.last_change_tick = tick;
            }
            unit.health = update.health;
        }

        self.installations.clone_from(&snapshot.installations);
        if self.terrain.is_none() {
            self.terrain.clone_from(&snapshot.terrain);
        }
        if self.weather.is_none() {
            self.weather.clone_from(&snapshot.weather);
        }
    }

    /// Tick of the last ingested snapshot.
    #[must_use]
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Arena width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Arena height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Arena center.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// State of the controlled player.
    #[must_use]
    pub fn me(&self) -> &PlayerState {
        &self.me
    }

    /// State of the opponent.
    #[must_use]
    pub fn opponent(&self) -> &PlayerState {
        &self.opponent
    }

    /// Look up a unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// All known units in ascending id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Units of the controlled player.
    pub fn own_units(&self) -> impl Iterator<Item = &Unit> {
        let me = self.me.id;
        self.units.values().filter(move |u| u.owner == me)
    }

    /// Visible units of anyone else.
    pub fn enemy_units(&self) -> impl Iterator<Item = &Unit> {
        let me = self.me.id;
        self.units.values().filter(move |u| u.owner != me)
    }

    /// Own units carrying `tag`.
    pub fn members(&self, tag: GroupTag) -> impl Iterator<Item = &Unit> {
        self.own_units().filter(move |u| u.group == Some(tag))
    }

    /// Own units without a group tag.
    pub fn untagged_own(&self) -> impl Iterator<Item = &Unit> {
        self.own_units().filter(|u| u.group.is_none())
    }

    /// Mean position of a set of units, or the arena center when empty.
    #[must_use]
    pub fn centroid<'a, I>(&self, units: I) -> Vec2
    where
        I: IntoIterator<Item = &'a Unit>,
    {
        math::mean(units.into_iter().map(|u| u.position)).unwrap_or_else(|| self.center())
    }

    /// All installations as last reported.
    #[must_use]
    pub fn installations(&self) -> &[Installation] {
        &self.installations
    }

    /// Number of control centers owned by `player`.
    #[must_use]
    pub fn control_centers_owned_by(&self, player: PlayerId) -> usize {
        self.installations
            .iter()
            .filter(|i| i.kind == InstallationKind::ControlCenter && i.owner == Some(player))
            .count()
    }

    /// Terrain under a point, plain when unknown.
    #[must_use]
    pub fn terrain_at(&self, position: Vec2, cell_size: f64) -> Terrain {
        self.terrain
            .as_ref()
            .map_or(Terrain::Plain, |grid| grid.at_position(position, cell_size))
    }

    /// Weather over a point, clear when unknown.
    #[must_use]
    pub fn weather_at(&self, position: Vec2, cell_size: f64) -> Weather {
        self.weather
            .as_ref()
            .map_or(Weather::Clear, |grid| grid.at_position(position, cell_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{UnitSnapshot, UnitUpdate};

    fn tank(id: UnitId, owner: PlayerId, x: f64, y: f64) -> UnitSnapshot {
        UnitSnapshot {
            id,
            owner,
            category: UnitCategory::GroundHeavy,
            position: Vec2::new(x, y),
            health: 100,
            max_health: 100,
            group: None,
        }
    }

    fn snapshot(tick: Tick) -> WorldSnapshot {
        WorldSnapshot::empty(tick, 1024.0, 1, 2)
    }

    #[test]
    fn test_new_units_are_inserted() {
        let mut view = EntityView::new();
        let mut world = snapshot(0);
        world.new_units = vec![tank(1, 1, 10.0, 10.0), tank(2, 2, 500.0, 500.0)];
        view.ingest(&world);

        assert_eq!(view.own_units().count(), 1);
        assert_eq!(view.enemy_units().count(), 1);
        assert_eq!(view.unit(1).unwrap().last_change_tick, 0);
    }

    #[test]
    fn test_movement_updates_change_tick() {
        let mut view = EntityView::new();
        let mut world = snapshot(0);
        world.new_units = vec![tank(1, 1, 10.0, 10.0)];
        view.ingest(&world);

        let mut world = snapshot(7);
        world.unit_updates = vec![UnitUpdate {
            id: 1,
            position: Vec2::new(11.0, 10.0),
            health: 100,
            group: None,
        }];
        view.ingest(&world);
        assert_eq!(view.unit(1).unwrap().last_change_tick, 7);
    }

    #[test]
    fn test_health_only_change_keeps_change_tick() {
        let mut view = EntityView::new();
        let mut world = snapshot(0);
        world.new_units = vec![tank(1, 1, 10.0, 10.0)];
        view.ingest(&world);

        let mut world = snapshot(9);
        world.unit_updates = vec![UnitUpdate {
            id: 1,
            position: Vec2::new(10.0, 10.0),
            health: 40,
            group: None,
        }];
        view.ingest(&world);
        let unit = view.unit(1).unwrap();
        assert_eq!(unit.health, 40);
        assert_eq!(unit.last_change_tick, 0);
    }

    #[test]
    fn test_zero_health_removes_unit() {
        let mut view = EntityView::new();
        let mut world = snapshot(0);
        world.new_units = vec![tank(1, 1, 10.0, 10.0)];
        view.ingest(&world);

        let mut world = snapshot(1);
        world.unit_updates = vec![UnitUpdate {
            id: 1,
            position: Vec2::new(10.0, 10.0),
            health: 0,
            group: None,
        }];
        view.ingest(&world);
        assert!(view.unit(1).is_none());
    }

    #[test]
    fn test_unknown_update_is_ignored() {
        let mut view = EntityView::new();
        let mut world = snapshot(3);
        world.unit_updates = vec![UnitUpdate {
            id: 42,
            position: Vec2::new(1.0, 1.0),
            health: 10,
            group: Some(1),
        }];
        view.ingest(&world);
        assert_eq!(view.units().count(), 0);
    }

    #[test]
    fn test_empty_centroid_is_arena_center() {
        let mut view = EntityView::new();
        view.ingest(&snapshot(0));
        assert_eq!(view.centroid(view.members(3)), Vec2::new(512.0, 512.0));
    }

    #[test]
    fn test_terrain_grid_kept_from_first_snapshot() {
        let mut view = EntityView::new();
        let mut world = snapshot(0);
        world.terrain = Some(CellGrid::filled(32, 32, Terrain::Forest));
        view.ingest(&world);
        view.ingest(&snapshot(1));
        assert_eq!(view.terrain_at(Vec2::new(5.0, 5.0), 32.0), Terrain::Forest);
    }
}
