// engine/src/engine/scenario.rs
#![forbid(unsafe_code)]

/*
Random highway scenarios
------------------------

A scenario is a straight road with `lanes_count` lanes, one controlled ego
vehicle and `vehicles_count` other vehicles of a single behaviour model.

Placement
- The ego sits at x = 0 on `ego_lane` (clamped to the road).
- Traffic is laid out front to back starting at `traffic_start`: each vehicle
  gets a random lane and a random velocity in DEFAULT_VELOCITIES, and sits one
  random offset ahead of the previous one:
      offset = spacing * 1.5 * velocity * exp(-5/30 * lanes_count) * U(0.9, 1.1)
  so denser (more lanes) roads pack vehicles tighter longitudinally.
- Traffic that would land within EGO_CLEARANCE of the ego in its lane is
  pushed ahead of it.

Determinism
- Everything is drawn from one StdRng seeded with the scenario seed.
*/

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::engine::agents::{AgentFactory, AgentKind};
use crate::engine::behavior::SpeedLadder;
use crate::engine::constants::{DEFAULT_LANE_WIDTH, DEFAULT_VELOCITIES, VEHICLE_LENGTH};
use crate::engine::road::Road;
use crate::engine::vehicle::{Vehicle, VehicleId};

const EGO_CLEARANCE: f64 = 3.0 * VEHICLE_LENGTH;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub lanes_count: usize,
    pub lane_width: f64,
    /// Other vehicles, the ego excluded.
    pub vehicles_count: usize,
    pub vehicles_type: AgentKind,
    pub ego_lane: usize,
    pub ego_velocity: f64,
    /// Longitudinal density multiplier (higher = sparser).
    pub spacing: f64,
    /// x of the first traffic vehicle; negative puts traffic behind the ego.
    pub traffic_start: f64,
    pub ego_ladder: SpeedLadder,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            lanes_count: 4,
            lane_width: DEFAULT_LANE_WIDTH,
            vehicles_count: 20,
            vehicles_type: AgentKind::Idm,
            ego_lane: 0,
            ego_velocity: 25.0,
            spacing: 1.0,
            traffic_start: -60.0,
            ego_ladder: SpeedLadder::default(),
        }
    }
}

impl Road {
    /**
     * Straight road populated with `cfg.vehicles_count` vehicles of `cfg.vehicles_type`.
     *
     * No ego vehicle is added; see `ScenarioConfig::build`.
     */
    pub fn create_random_road(cfg: &ScenarioConfig, rng: &mut StdRng) -> Road {
        let mut road = Road::straight(cfg.lanes_count, cfg.lane_width);
        populate(&mut road, cfg, rng, None);
        road
    }
}

impl ScenarioConfig {
    /// Build the road and its controlled ego vehicle.
    pub fn build(&self, seed: u64) -> (Road, VehicleId) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut road = Road::straight(self.lanes_count, self.lane_width);
        let ego = road.spawn_controlled(self.ego_lane, 0.0, self.ego_velocity, self.ego_ladder);
        let ego_lane = road.vehicles[0].lane_index;
        populate(&mut road, self, &mut rng, Some(ego_lane));

        log::debug!(
            "scenario seed={} lanes={} vehicles={} type={}",
            seed,
            road.lanes_count(),
            road.vehicles.len(),
            self.vehicles_type
        );
        (road, ego)
    }
}

fn populate(road: &mut Road, cfg: &ScenarioConfig, rng: &mut StdRng, ego_lane: Option<usize>) {
    let lanes = road.lanes_count();
    let density = (-5.0 / 30.0 * lanes as f64).exp();
    let spacing = if cfg.spacing > 0.0 { cfg.spacing } else { 1.0 };
    let (v_lo, v_hi) = DEFAULT_VELOCITIES;

    let mut x = cfg.traffic_start;
    for _ in 0..cfg.vehicles_count {
        let lane = rng.gen_range(0..lanes);
        let velocity = rng.gen_range(v_lo..v_hi);
        let offset = spacing * 1.5 * velocity * density * rng.gen_range(0.9..1.1);
        x += offset.max(VEHICLE_LENGTH * 1.5);

        if ego_lane == Some(lane) && x.abs() < EGO_CLEARANCE {
            x = EGO_CLEARANCE;
        }

        let id = road.next_vehicle_id();
        let base = Vehicle::idm(id, &road.lanes[lane], x, velocity);
        let v = cfg.vehicles_type.create_from(&base);
        road.push(v);
    }
}
