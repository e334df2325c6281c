// engine/tests/config_serde.rs
#![forbid(unsafe_code)]

/**
 * Serialization contracts for the user-facing configuration types.
 *
 * Purpose:
 * - Config files may name only the fields they change; everything else takes
 *   the documented defaults.
 * - Enum spellings in files stay snake_case.
 */
use highway_engine::engine::{AgentKind, IdmParams, ScenarioConfig, SpeedLadder};
use highway_engine::{Action, MdpConfig, MdpError, RoadMdp};

#[test]
fn empty_objects_take_defaults() {
    let s: ScenarioConfig = serde_json::from_str("{}").expect("valid json");
    let m: MdpConfig = serde_json::from_str("{}").expect("valid json");
    let p: IdmParams = serde_json::from_str("{}").expect("valid json");

    assert_eq!(s, ScenarioConfig::default());
    assert_eq!(m, MdpConfig::default());
    assert_eq!(p, IdmParams::default());
    assert_eq!(m.tick_count(), 30);
}

#[test]
fn partial_scenario_overrides_only_named_fields() {
    let s: ScenarioConfig = serde_json::from_str(
        r#"{ "lanes_count": 2, "vehicles_type": "linear", "ego_ladder": { "min": 15.0, "max": 35.0, "count": 5 } }"#,
    )
    .expect("valid json");

    assert_eq!(s.lanes_count, 2);
    assert_eq!(s.vehicles_type, AgentKind::Linear);
    assert_eq!(s.ego_ladder, SpeedLadder::new(15.0, 35.0, 5));
    assert_eq!(s.vehicles_count, ScenarioConfig::default().vehicles_count);
}

#[test]
fn configs_round_trip_through_json() {
    let s = ScenarioConfig {
        lanes_count: 3,
        vehicles_count: 7,
        vehicles_type: AgentKind::Controlled,
        spacing: 1.5,
        ..ScenarioConfig::default()
    };
    let m = MdpConfig {
        action_timestep: 0.1,
        action_duration: 0.5,
    };

    let s2: ScenarioConfig = serde_json::from_str(&serde_json::to_string(&s).expect("serialize"))
        .expect("deserialize");
    let m2: MdpConfig = serde_json::from_str(&serde_json::to_string(&m).expect("serialize"))
        .expect("deserialize");

    assert_eq!(s, s2);
    assert_eq!(m, m2);
}

#[test]
fn agent_kind_names_parse_and_display() {
    for &k in AgentKind::all() {
        assert_eq!(k.to_string().parse::<AgentKind>(), Ok(k));
        let json = serde_json::to_string(&k).expect("serialize");
        assert_eq!(json, format!("\"{}\"", k.name()));
    }
    assert_eq!(AgentKind::parse(" IDM "), Some(AgentKind::Idm));
    assert!("bicycle".parse::<AgentKind>().is_err());
}

#[test]
fn mdp_config_validation_rejects_zero_ticks() {
    let bad = MdpConfig {
        action_timestep: 2.0,
        action_duration: 1.0,
    };
    assert_eq!(bad.tick_count(), 0);
    assert!(matches!(bad.validate(), Err(MdpError::InvalidTiming { .. })));
    assert_eq!(MdpConfig::default().validate(), Ok(()));
}

#[test]
fn degenerate_ladders_from_files_are_normalised() {
    let s: ScenarioConfig =
        serde_json::from_str(r#"{ "ego_ladder": { "min": 20.0, "max": 30.0, "count": 0 } }"#)
            .expect("valid json");
    assert_eq!(s.ego_ladder, SpeedLadder::new(20.0, 30.0, 1));
    assert_eq!(s.ego_ladder.max_index(), 0);

    let (road, ego) = s.build(1);
    let mdp = RoadMdp::with_default_timing(road, ego).expect("valid mdp");
    let actions = mdp.get_available_actions();
    assert!(!actions.contains(&Action::Faster.id()));
    assert!(!actions.contains(&Action::Slower.id()));
    assert_eq!(actions, vec![Action::Idle.id(), Action::LaneRight.id()]);

    let inverted: SpeedLadder =
        serde_json::from_str(r#"{ "min": 30.0, "max": 20.0, "count": 3 }"#).expect("valid json");
    assert_eq!(inverted, SpeedLadder::new(20.0, 30.0, 3));
    assert_eq!(inverted.speed(2), 30.0);
}

#[test]
fn hand_built_empty_ladder_has_a_single_rung() {
    let ladder = SpeedLadder {
        min: 20.0,
        max: 30.0,
        count: 0,
    };
    assert_eq!(ladder.max_index(), 0);
    assert_eq!(ladder.speed(3), 20.0);
    assert_eq!(ladder.index_of(27.0), 0);
}
