// engine/src/engine/behavior.rs
#![forbid(unsafe_code)]

use std::f64::consts::FRAC_PI_4;

use serde::{Deserialize, Serialize};

use crate::engine::constants::{
    KP_A, KP_HEADING, KP_LATERAL, MAX_STEERING_ANGLE, SPEED_COUNT, SPEED_MAX, SPEED_MIN, not_zero,
    wrap_to_pi,
};
use crate::engine::lane::Lane;
use crate::engine::vehicle::Vehicle;

/**
 * Discrete ladder of target speeds for controlled vehicles.
 *
 * Rung `i` maps to `min + i * (max - min) / (count - 1)`. A ladder with a single
 * rung always targets `min`.
 *
 * Deserialisation goes through `SpeedLadder::new`, so a config file cannot
 * produce an empty or inverted ladder.
 */
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSpeedLadder")]
pub struct SpeedLadder {
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

#[derive(Deserialize)]
struct RawSpeedLadder {
    min: f64,
    max: f64,
    count: usize,
}

impl From<RawSpeedLadder> for SpeedLadder {
    fn from(raw: RawSpeedLadder) -> Self {
        Self::new(raw.min, raw.max, raw.count)
    }
}

impl Default for SpeedLadder {
    fn default() -> Self {
        Self {
            min: SPEED_MIN,
            max: SPEED_MAX,
            count: SPEED_COUNT,
        }
    }
}

impl SpeedLadder {
    pub fn new(min: f64, max: f64, count: usize) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
            count: count.max(1),
        }
    }

    #[inline]
    pub fn max_index(&self) -> usize {
        self.count.saturating_sub(1)
    }

    pub fn speed(&self, index: usize) -> f64 {
        if self.count <= 1 {
            return self.min;
        }
        let i = index.min(self.max_index()) as f64;
        self.min + i * (self.max - self.min) / self.max_index() as f64
    }

    /// Nearest rung for `velocity`, clamped to the ladder.
    pub fn index_of(&self, velocity: f64) -> usize {
        if self.count <= 1 || self.max <= self.min {
            return 0;
        }
        let x = (velocity - self.min) / (self.max - self.min) * self.max_index() as f64;
        let x = x.round();
        if x <= 0.0 {
            0
        } else {
            (x as usize).min(self.max_index())
        }
    }
}

/// Per-vehicle state of a discrete (MDP-driven) vehicle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlledState {
    pub ladder: SpeedLadder,
    pub velocity_index: usize,
}

/**
 * Intelligent Driver Model (longitudinal) and MOBIL (lateral) parameters.
 */
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdmParams {
    /// Hard acceleration bound [m/s2].
    pub acc_max: f64,
    pub comfort_acc_max: f64,
    /// Comfortable deceleration (negative) [m/s2].
    pub comfort_acc_min: f64,
    /// Jam distance, vehicle length included [m].
    pub distance_wanted: f64,
    /// Desired time headway [s].
    pub time_wanted: f64,
    /// Velocity exponent.
    pub delta: f64,

    pub politeness: f64,
    pub lane_change_min_acc_gain: f64,
    pub lane_change_max_braking_imposed: f64,
    /// Minimum time between two lane-change decisions [s].
    pub lane_change_delay: f64,
}

impl Default for IdmParams {
    fn default() -> Self {
        Self {
            acc_max: 6.0,
            comfort_acc_max: 3.0,
            comfort_acc_min: -5.0,
            distance_wanted: 10.0,
            time_wanted: 1.5,
            delta: 4.0,
            politeness: 0.0,
            lane_change_min_acc_gain: 0.2,
            lane_change_max_braking_imposed: 2.0,
            lane_change_delay: 1.0,
        }
    }
}

impl IdmParams {
    /// Desired bumper-to-bumper gap between `ego` and the vehicle it follows.
    pub fn desired_gap(&self, ego: &Vehicle, front: &Vehicle) -> f64 {
        let ab = -self.comfort_acc_max * self.comfort_acc_min;
        let dv = ego.velocity - front.velocity;
        let gap = self.distance_wanted
            + ego.velocity * self.time_wanted
            + ego.velocity * dv / (2.0 * ab.sqrt());
        gap.max(0.0)
    }

    /// IDM acceleration of `ego` following `front` (free road when `None`).
    pub fn acceleration(&self, ego: &Vehicle, front: Option<&Vehicle>) -> f64 {
        let v = ego.velocity.max(0.0);
        let mut acc = if ego.target_velocity > 0.0 {
            self.comfort_acc_max * (1.0 - (v / ego.target_velocity).powf(self.delta))
        } else if v > 0.0 {
            self.comfort_acc_min
        } else {
            0.0
        };

        if let Some(front) = front {
            let d = ego.lane_distance_to(front).max(1e-3);
            acc -= self.comfort_acc_max * (self.desired_gap(ego, front) / d).powi(2);
        }

        acc.clamp(-self.acc_max, self.acc_max)
    }
}

/// Linear acceleration model: `a = theta . phi`, lateral behaviour from MOBIL.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearParams {
    pub theta: [f64; 3],
    pub idm: IdmParams,
}

impl Default for LinearParams {
    fn default() -> Self {
        Self {
            theta: [0.3, 0.14, 0.8],
            idm: IdmParams::default(),
        }
    }
}

impl LinearParams {
    pub fn acceleration(&self, features: &[f64; 3]) -> f64 {
        let a: f64 = self.theta.iter().zip(features).map(|(w, f)| w * f).sum();
        a.clamp(-self.idm.acc_max, self.idm.acc_max)
    }
}

/// Closed set of behaviour models sharing one kinematic state (`Vehicle`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Behavior {
    Controlled(ControlledState),
    Idm(IdmParams),
    Linear(LinearParams),
    Obstacle,
}

impl Behavior {
    pub fn name(&self) -> &'static str {
        match self {
            Behavior::Controlled(_) => "controlled",
            Behavior::Idm(_) => "idm",
            Behavior::Linear(_) => "linear",
            Behavior::Obstacle => "obstacle",
        }
    }

    /// IDM/MOBIL parameters driving lateral decisions, if any.
    pub fn idm_params(&self) -> Option<&IdmParams> {
        match self {
            Behavior::Idm(p) => Some(p),
            Behavior::Linear(p) => Some(&p.idm),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Low-level controllers
// -----------------------------------------------------------------------------

/// Proportional speed tracking towards `vehicle.target_velocity`.
#[inline]
pub fn velocity_control(vehicle: &Vehicle) -> f64 {
    KP_A * (vehicle.target_velocity - vehicle.velocity)
}

/**
 * Lateral position + heading cascade towards the centre line of `target`.
 *
 * Outer loop: lateral offset -> lateral velocity command -> heading command.
 * Inner loop: heading error -> yaw-rate command -> steering angle.
 */
pub fn steering_control(vehicle: &Vehicle, target: &Lane) -> f64 {
    let (longitudinal, lateral) = target.local_coordinates(vehicle.position);
    let v = not_zero(vehicle.velocity);

    let lateral_velocity_command = -KP_LATERAL * lateral;
    let heading_command = (lateral_velocity_command / v).clamp(-1.0, 1.0).asin();
    let heading_ref = target.heading_at(longitudinal) + heading_command.clamp(-FRAC_PI_4, FRAC_PI_4);

    let heading_rate_command = KP_HEADING * wrap_to_pi(heading_ref - vehicle.heading);
    let steering = (Vehicle::LENGTH / v * heading_rate_command).atan();
    steering.clamp(-MAX_STEERING_ANGLE, MAX_STEERING_ANGLE)
}
