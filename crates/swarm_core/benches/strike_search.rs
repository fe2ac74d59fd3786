//! Strike target search benchmarks for swarm_core.
//!
//! Run with: `cargo bench -p swarm_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use swarm_core::config::TacticsConfig;
use swarm_core::constants::GameConstants;
use swarm_core::entity_view::EntityView;
use swarm_core::math::Vec2;
use swarm_core::strike::find_strike_target;
use swarm_core::units::UnitCategory;
use swarm_core::world::{UnitSnapshot, WorldSnapshot};

fn unit(id: u64, owner: u64, category: UnitCategory, position: Vec2) -> UnitSnapshot {
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

/// Two armies of `per_side` units facing each other across the arena middle.
fn front_line(per_side: u64) -> EntityView {
    let mut world = WorldSnapshot::empty(0, 1024.0, 1, 2);
    let columns = 20;
    for i in 0..per_side {
        let column = (i % columns) as f64;
        let row = (i / columns) as f64;
        world.new_units.push(unit(
            i + 1,
            1,
            UnitCategory::ALL[(i % 5) as usize],
            Vec2::new(200.0 + column * 30.0, 420.0 - row * 6.0),
        ));
        world.new_units.push(unit(
            10_000 + i,
            2,
            UnitCategory::ALL[(i % 5) as usize],
            Vec2::new(205.0 + column * 30.0, 480.0 + row * 6.0),
        ));
    }
    let mut view = EntityView::new();
    view.ingest(&world);
    view
}

pub fn strike_search_benchmark(c: &mut Criterion) {
    let constants = GameConstants::default();
    let config = TacticsConfig::default();
    let mut group = c.benchmark_group("find_strike_target");
    for per_side in [100u64, 500] {
        let view = front_line(per_side);
        group.bench_with_input(BenchmarkId::from_parameter(per_side), &view, |b, view| {
            b.iter(|| black_box(find_strike_target(view, &constants, &config)));
        });
    }
    group.finish();
}

criterion_group!(benches, strike_search_benchmark);
criterion_main!(benches);
