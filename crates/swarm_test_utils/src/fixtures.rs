//! Test fixtures and helpers.
//!
//! Snapshot builders and unit layouts for consistent testing.

use swarm_core::math::Vec2;
use swarm_core::units::{GroupTag, InstallationId, PlayerId, UnitCategory, UnitId};
use swarm_core::world::{
    CellGrid, Installation, InstallationKind, StrikeAnnouncement, Terrain, Tick, UnitSnapshot,
    UnitUpdate, Weather, WorldSnapshot,
};

/// Player id of the controlled side in fixtures.
pub const ME: PlayerId = 1;
/// Player id of the opposing side in fixtures.
pub const OPPONENT: PlayerId = 2;
/// Default arena side length.
pub const ARENA: f64 = 1024.0;

/// A full-health unit.
#[must_use]
pub fn unit(id: UnitId, owner: PlayerId, category: UnitCategory, position: Vec2) -> UnitSnapshot {
    UnitSnapshot {
        id,
        owner,
        category,
        position,
        health: 100,
        max_health: 100,
        group: None,
    }
}

/// Positions of a `count`-unit block, five per row, `spacing` apart.
#[must_use]
pub fn block_positions(origin: Vec2, count: usize, spacing: f64) -> Vec<Vec2> {
    (0..count)
        .map(|i| origin + Vec2::new((i % 5) as f64 * spacing, (i / 5) as f64 * spacing))
        .collect()
}

/// Builds [`WorldSnapshot`]s with automatically numbered units.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    snapshot: WorldSnapshot,
    next_id: UnitId,
}

impl SnapshotBuilder {
    /// Empty square arena at `tick`.
    #[must_use]
    pub fn new(tick: Tick) -> Self {
        Self {
            snapshot: WorldSnapshot::empty(tick, ARENA, ME, OPPONENT),
            next_id: 1,
        }
    }

    /// Change the arena size.
    #[must_use]
    pub fn arena(mut self, width: f64, height: f64) -> Self {
        self.snapshot.width = width;
        self.snapshot.height = height;
        self
    }

    /// Start numbering subsequent units at `id`.
    #[must_use]
    pub fn first_id(mut self, id: UnitId) -> Self {
        self.next_id = id;
        self
    }

    /// Add a fully specified unit.
    #[must_use]
    pub fn unit(mut self, unit: UnitSnapshot) -> Self {
        self.next_id = self.next_id.max(unit.id + 1);
        self.snapshot.new_units.push(unit);
        self
    }

    fn push(self, owner: PlayerId, category: UnitCategory, position: Vec2, group: Option<GroupTag>) -> Self {
        let id = self.next_id;
        self.unit(UnitSnapshot {
            group,
            ..unit(id, owner, category, position)
        })
    }

    /// Add an untagged own unit.
    #[must_use]
    pub fn own(self, category: UnitCategory, position: Vec2) -> Self {
        self.push(ME, category, position, None)
    }

    /// Add an own unit already tagged with `group`.
    #[must_use]
    pub fn own_tagged(self, category: UnitCategory, position: Vec2, group: GroupTag) -> Self {
        self.push(ME, category, position, Some(group))
    }

    /// Add an enemy unit.
    #[must_use]
    pub fn enemy(self, category: UnitCategory, position: Vec2) -> Self {
        self.push(OPPONENT, category, position, None)
    }

    /// Add a block of own units, optionally tagged.
    #[must_use]
    pub fn own_block(
        self,
        category: UnitCategory,
        origin: Vec2,
        count: usize,
        spacing: f64,
        group: Option<GroupTag>,
    ) -> Self {
        block_positions(origin, count, spacing)
            .into_iter()
            .fold(self, |b, p| b.push(ME, category, p, group))
    }

    /// Add a block of enemy units.
    #[must_use]
    pub fn enemy_block(self, category: UnitCategory, origin: Vec2, count: usize, spacing: f64) -> Self {
        block_positions(origin, count, spacing)
            .into_iter()
            .fold(self, |b, p| b.push(OPPONENT, category, p, None))
    }

    /// Report a change to a known unit.
    #[must_use]
    pub fn update(mut self, id: UnitId, position: Vec2, health: u32, group: Option<GroupTag>) -> Self {
        self.snapshot.unit_updates.push(UnitUpdate {
            id,
            position,
            health,
            group,
        });
        self
    }

    /// Add an installation.
    #[must_use]
    pub fn installation(
        mut self,
        id: InstallationId,
        kind: InstallationKind,
        owner: Option<PlayerId>,
        top_left: Vec2,
        production: Option<UnitCategory>,
    ) -> Self {
        self.snapshot.installations.push(Installation {
            id,
            owner,
            kind,
            top_left,
            production,
        });
        self
    }

    /// Set the own cooldowns.
    #[must_use]
    pub fn my_cooldowns(mut self, action: u32, strike: u32) -> Self {
        self.snapshot.me.remaining_action_cooldown = action;
        self.snapshot.me.remaining_strike_cooldown = strike;
        self
    }

    /// Announce an opponent strike at `point` with its cooldown at `remaining`.
    #[must_use]
    pub fn opponent_strike(mut self, point: Vec2, caster: UnitId, remaining: u32) -> Self {
        self.snapshot.opponent.remaining_strike_cooldown = remaining;
        self.snapshot.opponent.next_strike = Some(StrikeAnnouncement { point, caster });
        self
    }

    /// Attach a terrain grid.
    #[must_use]
    pub fn terrain(mut self, grid: CellGrid<Terrain>) -> Self {
        self.snapshot.terrain = Some(grid);
        self
    }

    /// Attach a weather grid.
    #[must_use]
    pub fn weather(mut self, grid: CellGrid<Weather>) -> Self {
        self.snapshot.weather = Some(grid);
        self
    }

    /// Finish the snapshot.
    #[must_use]
    pub fn build(self) -> WorldSnapshot {
        self.snapshot
    }
}

/// Snapshot with no changes at `tick`.
#[must_use]
pub fn quiet_tick(tick: Tick) -> WorldSnapshot {
    WorldSnapshot::empty(tick, ARENA, ME, OPPONENT)
}

/// Two mixed armies in opposite corners followed by `ticks - 1` quiet ticks.
#[must_use]
pub fn skirmish_script(ticks: Tick) -> Vec<WorldSnapshot> {
    let mut builder = SnapshotBuilder::new(0);
    for (i, category) in UnitCategory::ALL.into_iter().enumerate() {
        let row = i as f64 * 40.0;
        builder = builder
            .own_block(category, Vec2::new(40.0, 40.0 + row), 10, 4.0, None)
            .enemy_block(category, Vec2::new(900.0, 760.0 + row), 10, 4.0);
    }
    let mut script = vec![builder.build()];
    script.extend((1..ticks).map(quiet_tick));
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_numbers_units() {
        let world = SnapshotBuilder::new(3)
            .own(UnitCategory::GroundHeavy, Vec2::new(1.0, 1.0))
            .enemy(UnitCategory::AirInterceptor, Vec2::new(2.0, 2.0))
            .build();
        assert_eq!(world.tick, 3);
        let ids: Vec<_> = world.new_units.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(world.new_units[1].owner, OPPONENT);
    }

    #[test]
    fn test_explicit_unit_advances_numbering() {
        let world = SnapshotBuilder::new(0)
            .unit(unit(40, ME, UnitCategory::GroundLight, Vec2::ZERO))
            .own(UnitCategory::GroundLight, Vec2::ZERO)
            .build();
        assert_eq!(world.new_units[1].id, 41);
    }

    #[test]
    fn test_skirmish_script_shape() {
        let script = skirmish_script(4);
        assert_eq!(script.len(), 4);
        assert_eq!(script[0].new_units.len(), 100);
        assert!(script[1..].iter().all(|w| w.new_units.is_empty()));
    }
}
