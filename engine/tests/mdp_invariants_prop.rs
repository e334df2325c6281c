// engine/tests/mdp_invariants_prop.rs
#![forbid(unsafe_code)]

/**
 * Property/invariant tests for the MDP transition kernel.
 *
 * Purpose:
 * - Provide fuzz-like coverage using generated scenarios and rollout lengths.
 * - Lock core invariants that must hold regardless of policy logic.
 *
 * Invariants covered:
 * - `get_available_actions` always holds IDLE, stays in range, has no
 *   duplicates and respects lane and speed boundaries.
 * - Each `step` advances exactly `tick_count()` ticks.
 * - `reward` matches the closed-form formula on the reached state.
 * - Vehicle ids are neither created nor lost, velocities stay >= 0.
 * - `simplified()` is a subset that always holds the ego and never mutates
 *   its source.
 * - `is_terminal` is exactly the ego crash flag, and a crash is permanent.
 */
use highway_engine::engine::ScenarioConfig;
use highway_engine::{ACTION_DIM, Action, RoadMdp};
use proptest::prelude::*;

fn assert_action_set_consistent(mdp: &RoadMdp) {
    let actions = mdp.get_available_actions();
    let ego = mdp.ego();
    let state = ego.controlled_state().expect("controlled ego");

    assert_eq!(actions.first(), Some(&Action::Idle.id()));
    for &a in &actions {
        assert!(a < ACTION_DIM);
    }
    let mut dedup = actions.clone();
    dedup.sort_unstable();
    dedup.dedup();
    assert_eq!(dedup.len(), actions.len());

    if ego.lane_index == 0 {
        assert!(!actions.contains(&Action::LaneLeft.id()));
    }
    if ego.lane_index + 1 == mdp.road().lanes_count() {
        assert!(!actions.contains(&Action::LaneRight.id()));
    }
    if state.velocity_index == state.ladder.max_index() {
        assert!(!actions.contains(&Action::Faster.id()));
    }
    if state.velocity_index == 0 {
        assert!(!actions.contains(&Action::Slower.id()));
    }
}

fn expected_reward(mdp: &RoadMdp, action: usize) -> f64 {
    let ego = mdp.ego();
    let lane_change = if Action::from_id(action).expect("in range").is_lane_change() {
        -RoadMdp::LANE_CHANGE_COST
    } else {
        0.0
    };
    let crashed = if ego.crashed { 1.0 } else { 0.0 };
    lane_change
        + (-RoadMdp::COLLISION_COST * crashed
            + RoadMdp::RIGHT_LANE_REWARD * ego.lane_index as f64
            + RoadMdp::HIGH_VELOCITY_REWARD * ego.speed_index() as f64)
}

fn sorted_ids(mdp: &RoadMdp) -> Vec<u32> {
    let mut ids: Vec<u32> = mdp.road().vehicles.iter().map(|v| v.id.0).collect();
    ids.sort_unstable();
    ids
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn generated_rollout_respects_core_invariants(
        seed in any::<u64>(),
        lanes in 1usize..5,
        vehicles in 0usize..12,
        ego_lane in 0usize..5,
        steps in 1usize..8,
        picks in proptest::collection::vec(any::<usize>(), 8),
    ) {
        let cfg = ScenarioConfig {
            lanes_count: lanes,
            vehicles_count: vehicles,
            ego_lane,
            ..ScenarioConfig::default()
        };
        let (road, ego) = cfg.build(seed);
        let mut mdp = RoadMdp::with_default_timing(road, ego).expect("valid scenario");
        let ids = sorted_ids(&mdp);
        let ticks = mdp.tick_count() as u64;

        for (i, pick) in picks.iter().take(steps).enumerate() {
            assert_action_set_consistent(&mdp);

            let source = mdp.road().clone();
            let simple = mdp.simplified();
            prop_assert_eq!(mdp.road(), &source);
            prop_assert_eq!(simple.ego(), mdp.ego());
            for v in &simple.road().vehicles {
                prop_assert!(mdp.road().vehicle(v.id).is_some());
            }

            let actions = mdp.get_available_actions();
            let aid = actions[pick % actions.len()];
            let was_terminal = mdp.is_terminal();

            let r = mdp.step(aid).expect("available action");

            prop_assert_eq!(mdp.road().timesteps, (i as u64 + 1) * ticks);
            prop_assert_eq!(r, expected_reward(&mdp, aid));
            prop_assert_eq!(sorted_ids(&mdp), ids.clone());
            prop_assert!(mdp.road().vehicles.iter().all(|v| v.velocity >= 0.0));
            prop_assert_eq!(mdp.is_terminal(), mdp.ego().crashed);
            if was_terminal {
                prop_assert!(mdp.is_terminal());
            }
        }
    }

    #[test]
    fn tick_count_is_the_floor_of_duration_over_timestep(
        ticks in 1u32..60,
        frac in 0.0f64..0.99,
    ) {
        let timestep = 0.05;
        let duration = (ticks as f64 + frac) * timestep;
        let cfg = ScenarioConfig { vehicles_count: 0, ..ScenarioConfig::default() };
        let (road, ego) = cfg.build(0);
        let mut mdp = RoadMdp::new(road, ego, timestep, duration).expect("at least one tick");

        let expected = (duration / timestep).floor() as u64;
        prop_assert_eq!(mdp.tick_count() as u64, expected);
        mdp.step(Action::Idle.id()).expect("legal action");
        prop_assert_eq!(mdp.road().timesteps, expected);
    }
}
