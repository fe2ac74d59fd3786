//! Decision determinism across repeated and parallel runs.

use proptest::prelude::*;
use swarm_core::config::TacticsConfig;
use swarm_core::constants::GameConstants;
use swarm_core::world::WorldSnapshot;
use swarm_test_utils::determinism::{
    decision_trace, find_first_divergence, run_parallel_controllers, verify_controller_determinism,
};
use swarm_test_utils::fixtures::{quiet_tick, skirmish_script};
use swarm_test_utils::strategies::arb_armies;

#[test]
fn test_skirmish_with_formation_is_deterministic() {
    let script = skirmish_script(60);
    verify_controller_determinism(5, &TacticsConfig::default(), &GameConstants::default(), &script)
        .assert_deterministic();
}

#[test]
fn test_parallel_skirmish_matches_sequential() {
    let script = skirmish_script(60);
    let config = TacticsConfig::default();
    let constants = GameConstants::default();
    let sequential = verify_controller_determinism(1, &config, &constants, &script);
    let parallel = run_parallel_controllers(8, &config, &constants, &script);
    parallel.assert_deterministic();
    assert_eq!(parallel.hashes[0], sequential.hashes[0]);
}

#[test]
fn test_formation_switch_changes_trace() {
    let script = skirmish_script(30);
    let constants = GameConstants::default();
    let with = decision_trace(&TacticsConfig::default(), &constants, &script);
    let without = decision_trace(
        &TacticsConfig {
            run_formation: false,
            ..TacticsConfig::default()
        },
        &constants,
        &script,
    );
    // The first tick already differs: a rect selection for the split.
    assert_eq!(find_first_divergence(&with, &without), Some(0));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_random_armies_decide_identically(armies in arb_armies(25)) {
        let mut opening = WorldSnapshot::empty(0, 1024.0, 1, 2);
        opening.new_units = armies;
        let mut script = vec![opening];
        script.extend((1..20).map(quiet_tick));

        let result = verify_controller_determinism(
            2,
            &TacticsConfig::default(),
            &GameConstants::default(),
            &script,
        );
        prop_assert!(result.is_deterministic, "{:?}", result.hashes);
    }
}
