// engine/src/mdp/road_mdp.rs
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::engine::{
    AgentFactory, DEFAULT_ACTION_DURATION, DEFAULT_ACTION_TIMESTEP, Road, Vehicle, VehicleId,
};
use crate::mdp::actions::{ACTION_DIM, ACTIONS, Action};
use crate::mdp::error::MdpError;

/// Timing of one MDP action.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MdpConfig {
    /// Duration of one simulation tick [s].
    pub action_timestep: f64,
    /// Duration covered by one discrete action [s].
    pub action_duration: f64,
}

impl Default for MdpConfig {
    fn default() -> Self {
        Self {
            action_timestep: DEFAULT_ACTION_TIMESTEP,
            action_duration: DEFAULT_ACTION_DURATION,
        }
    }
}

impl MdpConfig {
    /// Inner ticks per action: `floor(action_duration / action_timestep)`.
    ///
    /// A fractional remainder is dropped silently.
    pub fn tick_count(&self) -> usize {
        let n = (self.action_duration / self.action_timestep).floor();
        if n.is_finite() && n > 0.0 { n as usize } else { 0 }
    }

    pub fn validate(&self) -> Result<(), MdpError> {
        let ok = self.action_timestep.is_finite()
            && self.action_timestep > 0.0
            && self.action_duration.is_finite()
            && self.tick_count() >= 1;
        if ok {
            Ok(())
        } else {
            Err(MdpError::InvalidTiming {
                action_timestep: self.action_timestep,
                action_duration: self.action_duration,
            })
        }
    }
}

/**
 * Discrete driving MDP over a continuous traffic simulation.
 *
 * Semantics:
 * - One action is issued to the ego vehicle once, then held while the road is
 *   ticked `tick_count()` times (`road.act()` then `road.step(dt)` per tick).
 * - The reward reads the ego state after the last tick.
 * - `simplified()` / `change_agents_to()` return independent copies; the source
 *   is never mutated. A plain `clone()` is the generic deep copy for branching.
 */
#[derive(Clone, Debug)]
pub struct RoadMdp {
    road: Road,
    ego: VehicleId,
    // Position of the ego in `road.vehicles`; kept in sync by every operation
    // that reorders or filters the arena.
    ego_index: usize,
    config: MdpConfig,
}

impl RoadMdp {
    pub const COLLISION_COST: f64 = 10.0;
    pub const LANE_CHANGE_COST: f64 = 1.0;
    pub const RIGHT_LANE_REWARD: f64 = 0.5;
    pub const HIGH_VELOCITY_REWARD: f64 = 1.0;
    pub const SAFE_DISTANCE: f64 = 150.0;

    pub fn new(
        road: Road,
        ego: VehicleId,
        action_timestep: f64,
        action_duration: f64,
    ) -> Result<Self, MdpError> {
        Self::from_config(
            road,
            ego,
            MdpConfig {
                action_timestep,
                action_duration,
            },
        )
    }

    pub fn with_default_timing(road: Road, ego: VehicleId) -> Result<Self, MdpError> {
        Self::from_config(road, ego, MdpConfig::default())
    }

    pub fn from_config(road: Road, ego: VehicleId, config: MdpConfig) -> Result<Self, MdpError> {
        config.validate()?;
        let ego_index = road.index_of(ego).ok_or(MdpError::UnknownVehicle(ego))?;
        if road.vehicles[ego_index].controlled_state().is_none() {
            return Err(MdpError::NotControlled(ego));
        }

        log::debug!(
            "road mdp: ego={} vehicles={} lanes={} ticks/action={}",
            ego,
            road.vehicles.len(),
            road.lanes_count(),
            config.tick_count()
        );

        Ok(Self {
            road,
            ego,
            ego_index,
            config,
        })
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[inline]
    pub fn road(&self) -> &Road {
        &self.road
    }

    #[inline]
    pub fn ego(&self) -> &Vehicle {
        &self.road.vehicles[self.ego_index]
    }

    #[inline]
    pub fn ego_id(&self) -> VehicleId {
        self.ego
    }

    #[inline]
    pub fn config(&self) -> MdpConfig {
        self.config
    }

    #[inline]
    pub fn action_timestep(&self) -> f64 {
        self.config.action_timestep
    }

    #[inline]
    pub fn action_duration(&self) -> f64 {
        self.config.action_duration
    }

    #[inline]
    pub fn tick_count(&self) -> usize {
        self.config.tick_count()
    }

    pub fn into_road(self) -> Road {
        self.road
    }

    // -------------------------------------------------------------------------
    // Action space
    // -------------------------------------------------------------------------

    /// The full action table, regardless of state.
    pub fn get_actions() -> &'static [Action; ACTION_DIM] {
        &ACTIONS
    }

    /**
     * Ids of the actions legal in the current state; `IDLE` is always included.
     *
     * Order: IDLE, LANE_LEFT, LANE_RIGHT, FASTER, SLOWER (legal ones only).
     * - Lane changes need an existing neighbour lane reachable from the ego position.
     * - Speed changes need room on the ego's speed ladder.
     */
    pub fn get_available_actions(&self) -> Vec<usize> {
        let ego = self.ego();
        let lanes = &self.road.lanes;
        let li = ego.lane_index;

        let mut actions = vec![Action::Idle.id()];
        if li > 0 && lanes[li - 1].is_reachable_from(ego.position) {
            actions.push(Action::LaneLeft.id());
        }
        if li + 1 < lanes.len() && lanes[li + 1].is_reachable_from(ego.position) {
            actions.push(Action::LaneRight.id());
        }
        if let Some(state) = ego.controlled_state() {
            if state.velocity_index < state.ladder.max_index() {
                actions.push(Action::Faster.id());
            }
            if state.velocity_index > 0 {
                actions.push(Action::Slower.id());
            }
        }
        actions
    }

    // -------------------------------------------------------------------------
    // Transition
    // -------------------------------------------------------------------------

    /// Issue `action` to the ego, run the inner tick loop, return the reward.
    pub fn step(&mut self, action: usize) -> Result<f64, MdpError> {
        let a = Action::from_id(action)?;
        self.road.act_vehicle(self.ego, a)?;

        let dt = self.config.action_timestep;
        for _ in 0..self.tick_count() {
            self.road.act();
            self.road.step(dt);
        }

        let r = self.reward(action)?;
        log::trace!(
            "t={:.2} action={} reward={:.3} lane={} v={:.2} crashed={}",
            self.road.time,
            a,
            r,
            self.ego().lane_index,
            self.ego().velocity,
            self.ego().crashed
        );
        Ok(r)
    }

    /**
     * Reward for having taken `action` and landed in the current state:
     *
     * `action_cost - COLLISION_COST * crashed + RIGHT_LANE_REWARD * lane
     *  + HIGH_VELOCITY_REWARD * speed_index`
     *
     * where lane changes cost `LANE_CHANGE_COST` and every other action is free.
     */
    pub fn reward(&self, action: usize) -> Result<f64, MdpError> {
        let a = Action::from_id(action)?;
        let action_reward = if a.is_lane_change() {
            -Self::LANE_CHANGE_COST
        } else {
            0.0
        };

        let ego = self.ego();
        let crashed = if ego.crashed { 1.0 } else { 0.0 };
        let state_reward = -Self::COLLISION_COST * crashed
            + Self::RIGHT_LANE_REWARD * ego.lane_index as f64
            + Self::HIGH_VELOCITY_REWARD * ego.speed_index() as f64;
        Ok(action_reward + state_reward)
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.ego().crashed
    }

    // -------------------------------------------------------------------------
    // State abstraction
    // -------------------------------------------------------------------------

    /**
     * Copy of the state keeping only traffic near the ego:
     * `-SAFE_DISTANCE / 2 < lane_distance_to(ego, v) < SAFE_DISTANCE`.
     *
     * The ego itself is always kept (its own distance is 0, inside the window).
     */
    pub fn simplified(&self) -> Self {
        let ego = self.ego().clone();
        let lo = -Self::SAFE_DISTANCE / 2.0;
        let hi = Self::SAFE_DISTANCE;

        let mut road = self.road.clone();
        road.vehicles.retain(|v| {
            let d = ego.lane_distance_to(v);
            v.id == ego.id || (lo < d && d < hi)
        });
        let ego_index = road
            .vehicles
            .iter()
            .position(|v| v.id == ego.id)
            .unwrap_or_default();

        Self {
            road,
            ego: self.ego,
            ego_index,
            config: self.config,
        }
    }

    /**
     * Copy of the state where every vehicle except the ego and obstacles is
     * rebuilt by `factory` from its current state. Order and ids are kept.
     */
    pub fn change_agents_to<F: AgentFactory + ?Sized>(&self, factory: &F) -> Self {
        let mut copy = self.clone();
        for v in &mut copy.road.vehicles {
            if v.id != self.ego && !v.is_obstacle() {
                *v = factory.create_from(v);
            }
        }
        copy
    }
}
