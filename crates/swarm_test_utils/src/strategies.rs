//! Proptest strategies for positions, units and group layouts.
//!
//! These generate random but reproducible inputs for the core's property
//! tests.

use proptest::prelude::*;
use swarm_core::math::Vec2;
use swarm_core::units::{PlayerId, UnitCategory, UnitId};
use swarm_core::world::UnitSnapshot;

use crate::fixtures::{ARENA, ME, OPPONENT};

/// A position inside the default arena, away from the border.
pub fn arb_position() -> impl Strategy<Value = Vec2> {
    (32.0..ARENA - 32.0, 32.0..ARENA - 32.0).prop_map(|(x, y)| Vec2::new(x, y))
}

/// An offset of at most `radius` along each axis.
pub fn arb_offset(radius: f64) -> impl Strategy<Value = Vec2> {
    (-radius..radius, -radius..radius).prop_map(|(x, y)| Vec2::new(x, y))
}

/// Any unit category.
pub fn arb_category() -> impl Strategy<Value = UnitCategory> {
    prop::sample::select(UnitCategory::ALL.to_vec())
}

/// A ground category.
pub fn arb_ground_category() -> impl Strategy<Value = UnitCategory> {
    prop::sample::select(vec![
        UnitCategory::GroundHeavy,
        UnitCategory::GroundLight,
        UnitCategory::GroundSupport,
    ])
}

/// Health values (1-100).
pub fn arb_health() -> impl Strategy<Value = u32> {
    1u32..=100u32
}

/// A unit of `owner` with arbitrary category, position and health.
pub fn arb_unit(id: UnitId, owner: PlayerId) -> impl Strategy<Value = UnitSnapshot> {
    (arb_category(), arb_position(), arb_health()).prop_map(move |(category, position, health)| {
        UnitSnapshot {
            id,
            owner,
            category,
            position,
            health,
            max_health: 100,
            group: None,
        }
    })
}

/// Up to `max_units` own units and as many enemies, with distinct ids.
pub fn arb_armies(max_units: usize) -> impl Strategy<Value = Vec<UnitSnapshot>> {
    (1..=max_units).prop_flat_map(|n| {
        let own: Vec<_> = (0..n as u64).map(|i| arb_unit(i + 1, ME)).collect();
        let enemy: Vec<_> = (0..n as u64).map(|i| arb_unit(10_000 + i, OPPONENT)).collect();
        (own, enemy).prop_map(|(mut own, enemy)| {
            own.extend(enemy);
            own
        })
    })
}

/// Enemy points scattered within `radius` of `center`, with health.
pub fn arb_enemy_cluster(
    center: Vec2,
    radius: f64,
    max_units: usize,
) -> impl Strategy<Value = Vec<(Vec2, u32)>> {
    proptest::collection::vec((arb_offset(radius), arb_health()), 0..max_units)
        .prop_map(move |units| units.into_iter().map(|(o, h)| (center + o, h)).collect())
}

/// Two resting group bodies `(centroid, radius)` that do not overlap by at
/// least `margin`.
pub fn arb_separated_bodies(margin: f64) -> impl Strategy<Value = ((Vec2, f64), (Vec2, f64))> {
    (arb_position(), 1.0..20.0f64, 1.0..20.0f64, 0.0..std::f64::consts::TAU, 1.0..200.0f64)
        .prop_map(move |(first, r1, r2, angle, gap)| {
            let distance = r1 + r2 + margin + gap;
            let second = first + Vec2::new(distance, 0.0).rotate(angle);
            ((first, r1), (second, r2))
        })
}
