// engine/tests/policy_contracts.rs
#![forbid(unsafe_code)]

/**
 * Cross-policy contract tests.
 *
 * Purpose:
 * - Enforce shared behavior contracts for policy implementations:
 *   legal action selection, determinism (where applicable), and input-state purity.
 *
 * Covered policy families:
 * - `RandomPolicy` (seeded deterministic RNG path)
 * - `IdlePolicy` (constant baseline)
 * - `LookaheadPolicy` (deterministic search path, with and without beam / agent model)
 */
use highway_engine::engine::{AgentKind, ScenarioConfig, SpeedLadder};
use highway_engine::policy::{BeamConfig, IdlePolicy, LookaheadPolicy, Policy, RandomPolicy};
use highway_engine::{Action, Road, RoadMdp, VehicleId};

#[derive(Clone, Debug, PartialEq)]
struct MdpSnapshot {
    road: Road,
    ego: VehicleId,
    available: Vec<usize>,
    terminal: bool,
}

fn snapshot(mdp: &RoadMdp) -> MdpSnapshot {
    MdpSnapshot {
        road: mdp.road().clone(),
        ego: mdp.ego_id(),
        available: mdp.get_available_actions(),
        terminal: mdp.is_terminal(),
    }
}

fn fixture_mdp() -> RoadMdp {
    let cfg = ScenarioConfig {
        lanes_count: 3,
        vehicles_count: 10,
        ego_lane: 1,
        ..ScenarioConfig::default()
    };
    let (road, ego) = cfg.build(2024);
    RoadMdp::with_default_timing(road, ego).expect("valid scenario")
}

/// Ego in lane 0 heading for a stopped obstacle 25 m ahead; only a lane change avoids it.
fn obstacle_mdp() -> RoadMdp {
    let mut road = Road::straight(2, 4.0);
    let ego = road.spawn_controlled(0, 0.0, 25.0, SpeedLadder::default());
    road.spawn_obstacle(0, 25.0);
    RoadMdp::with_default_timing(road, ego).expect("valid timing")
}

fn crashed_mdp() -> RoadMdp {
    let mut road = Road::straight(2, 4.0);
    let ego = road.spawn_controlled(0, 0.0, 25.0, SpeedLadder::default());
    road.vehicle_mut(ego).expect("ego").crashed = true;
    RoadMdp::with_default_timing(road, ego).expect("valid timing")
}

fn assert_legal_action(policy: &mut dyn Policy, mdp: &RoadMdp) {
    let available = mdp.get_available_actions();
    match policy.choose_action(mdp) {
        Some(aid) => assert!(available.contains(&aid), "{aid} not in {available:?}"),
        None => assert!(mdp.is_terminal()),
    }
}

fn lookahead_policies() -> Vec<LookaheadPolicy> {
    vec![
        LookaheadPolicy::new(1, 0.9),
        LookaheadPolicy::new(2, 0.9),
        LookaheadPolicy::new(2, 0.8).with_beam(Some(BeamConfig::new(1, 2))),
        LookaheadPolicy::new(2, 0.9).with_agent_model(Some(AgentKind::Idm)),
    ]
}

// -----------------------------------------------------------------------------
// RandomPolicy
// -----------------------------------------------------------------------------

#[test]
fn random_policy_returns_legal_actions() {
    let mdp = fixture_mdp();
    let mut p = RandomPolicy::new(123);
    for _ in 0..20 {
        assert_legal_action(&mut p, &mdp);
    }
}

#[test]
fn random_policy_is_seed_deterministic_for_fixed_state() {
    let mdp = fixture_mdp();
    let mut p1 = RandomPolicy::new(42);
    let mut p2 = RandomPolicy::new(42);
    for _ in 0..12 {
        assert_eq!(p1.choose_action(&mdp), p2.choose_action(&mdp));
    }
}

#[test]
fn random_policy_does_not_mutate_state() {
    let mdp = fixture_mdp();
    let before = snapshot(&mdp);
    let mut p = RandomPolicy::new(99);
    let _ = p.choose_action(&mdp);
    assert_eq!(before, snapshot(&mdp));
}

// -----------------------------------------------------------------------------
// IdlePolicy
// -----------------------------------------------------------------------------

#[test]
fn idle_policy_always_idles() {
    let mut p = IdlePolicy;
    for mdp in [fixture_mdp(), obstacle_mdp(), crashed_mdp()] {
        assert_eq!(p.choose_action(&mdp), Some(Action::Idle.id()));
    }
}

// -----------------------------------------------------------------------------
// LookaheadPolicy
// -----------------------------------------------------------------------------

#[test]
fn lookahead_policy_returns_legal_actions() {
    let mdp = fixture_mdp();
    for mut p in lookahead_policies() {
        assert_legal_action(&mut p, &mdp);
    }
}

#[test]
fn lookahead_policy_is_deterministic_for_fixed_state() {
    let mdp = fixture_mdp();
    for mut p in lookahead_policies() {
        let a1 = p.choose_action(&mdp);
        let a2 = p.choose_action(&mdp);
        assert_eq!(a1, a2);
    }
}

#[test]
fn lookahead_policy_does_not_mutate_state() {
    let mdp = fixture_mdp();
    let before = snapshot(&mdp);
    for mut p in lookahead_policies() {
        let _ = p.choose_action(&mdp);
        assert_eq!(before, snapshot(&mdp));
    }
}

#[test]
fn lookahead_policy_returns_none_on_terminal_state() {
    let mdp = crashed_mdp();
    for mut p in lookahead_policies() {
        assert_eq!(p.choose_action(&mdp), None);
    }
}

#[test]
fn lookahead_policy_swerves_around_an_obstacle() {
    let mdp = obstacle_mdp();
    for mut p in lookahead_policies() {
        assert_eq!(p.choose_action(&mdp), Some(Action::LaneRight.id()));
    }

    let mut greedy = LookaheadPolicy::new(2, 0.9).with_beam(Some(BeamConfig::new(0, 1)));
    assert_eq!(greedy.choose_action(&mdp), Some(Action::LaneRight.id()));
}

#[test]
fn lookahead_beam_limits_root_candidates() {
    let mdp = fixture_mdp();
    let full = LookaheadPolicy::new(1, 0.9);
    let beamed = LookaheadPolicy::new(1, 0.9).with_beam(Some(BeamConfig::new(0, 2)));

    let all = full.action_values(&mdp);
    let kept = beamed.action_values(&mdp);

    assert_eq!(
        all.iter().map(|(a, _)| *a).collect::<Vec<_>>(),
        mdp.get_available_actions()
    );
    assert_eq!(kept.len(), 2.min(all.len()));
    for entry in &kept {
        assert!(all.contains(entry));
    }
}
