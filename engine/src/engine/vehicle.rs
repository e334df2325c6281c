// engine/src/engine/vehicle.rs
#![forbid(unsafe_code)]

use std::fmt;

use crate::engine::behavior::{Behavior, ControlledState, IdmParams, LinearParams, SpeedLadder};
use crate::engine::constants::{VEHICLE_LENGTH, VEHICLE_WIDTH, wrap_to_pi};
use crate::engine::lane::{Lane, Position};
use crate::mdp::Action;

/// Stable vehicle handle.
///
/// Ids survive cloning, filtering (`RoadMdp::simplified`) and agent substitution,
/// so an id taken from one copy of a road addresses the same vehicle in another.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct VehicleId(pub u32);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Control inputs held for the duration of a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Control {
    pub acceleration: f64,
    pub steering: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Vehicle {
    pub id: VehicleId,
    pub behavior: Behavior,

    // kinematic state
    pub position: Position,
    pub heading: f64,
    pub velocity: f64,

    // lane bookkeeping
    pub lane_index: usize,
    pub target_lane_index: usize,
    pub target_velocity: f64,

    pub crashed: bool,
    pub control: Control,

    /// MOBIL lane changes (IDM / linear agents only).
    pub enable_lane_change: bool,
    /// Seconds since the last lane-change decision.
    pub lane_change_timer: f64,
}

impl Vehicle {
    pub const LENGTH: f64 = VEHICLE_LENGTH;
    pub const WIDTH: f64 = VEHICLE_WIDTH;

    /// Place a vehicle on the centre line of `lane`, aligned with it.
    pub fn new(
        id: VehicleId,
        behavior: Behavior,
        lane: &Lane,
        longitudinal: f64,
        velocity: f64,
    ) -> Self {
        Self {
            id,
            behavior,
            position: lane.position(longitudinal, 0.0),
            heading: lane.heading_at(longitudinal),
            velocity,
            lane_index: lane.index,
            target_lane_index: lane.index,
            target_velocity: velocity,
            crashed: false,
            control: Control::default(),
            enable_lane_change: true,
            lane_change_timer: 0.0,
        }
    }

    /// A discrete-speed vehicle driven by MDP actions.
    ///
    /// The initial velocity snaps its target onto the nearest ladder speed.
    pub fn controlled(
        id: VehicleId,
        lane: &Lane,
        longitudinal: f64,
        velocity: f64,
        ladder: SpeedLadder,
    ) -> Self {
        let velocity_index = ladder.index_of(velocity);
        let mut v = Self::new(
            id,
            Behavior::Controlled(ControlledState {
                ladder,
                velocity_index,
            }),
            lane,
            longitudinal,
            velocity,
        );
        v.target_velocity = ladder.speed(velocity_index);
        v
    }

    pub fn idm(id: VehicleId, lane: &Lane, longitudinal: f64, velocity: f64) -> Self {
        Self::new(id, Behavior::Idm(IdmParams::default()), lane, longitudinal, velocity)
    }

    pub fn linear(id: VehicleId, lane: &Lane, longitudinal: f64, velocity: f64) -> Self {
        Self::new(
            id,
            Behavior::Linear(LinearParams::default()),
            lane,
            longitudinal,
            velocity,
        )
    }

    /// A static obstacle; never replaced by agent substitution.
    pub fn obstacle(id: VehicleId, lane: &Lane, longitudinal: f64) -> Self {
        let mut v = Self::new(id, Behavior::Obstacle, lane, longitudinal, 0.0);
        v.enable_lane_change = false;
        v
    }

    // -------------------------------------------------------------------------
    // Behaviour queries
    // -------------------------------------------------------------------------

    #[inline]
    pub fn is_obstacle(&self) -> bool {
        matches!(self.behavior, Behavior::Obstacle)
    }

    #[inline]
    pub fn controlled_state(&self) -> Option<&ControlledState> {
        match &self.behavior {
            Behavior::Controlled(s) => Some(s),
            _ => None,
        }
    }

    /// Target rung on the speed ladder (controlled vehicles only).
    pub fn velocity_index(&self) -> Option<usize> {
        self.controlled_state().map(|s| s.velocity_index)
    }

    /// Current velocity mapped onto the discrete speed ladder.
    ///
    /// Vehicles without their own ladder are measured against the default one.
    pub fn speed_index(&self) -> usize {
        match self.controlled_state() {
            Some(s) => s.ladder.index_of(self.velocity),
            None => SpeedLadder::default().index_of(self.velocity),
        }
    }

    /// Signed longitudinal gap to `other` along the lanes (positive = ahead).
    #[inline]
    pub fn lane_distance_to(&self, other: &Vehicle) -> f64 {
        other.position[0] - self.position[0]
    }

    // -------------------------------------------------------------------------
    // High-level actuation
    // -------------------------------------------------------------------------

    /// Set a lane or speed intent; the low-level controllers execute it during ticks.
    ///
    /// Only controlled vehicles respond. Lane changes towards a missing or
    /// unreachable lane are ignored.
    pub fn act(&mut self, action: Action, lanes: &[Lane]) {
        let position = self.position;
        let lane_index = self.lane_index;
        let Behavior::Controlled(state) = &mut self.behavior else {
            log::trace!("vehicle {} ignores {}: not controlled", self.id, action);
            return;
        };

        match action {
            Action::Faster => {
                state.velocity_index = (state.velocity_index + 1).min(state.ladder.max_index());
                self.target_velocity = state.ladder.speed(state.velocity_index);
            }
            Action::Slower => {
                state.velocity_index = state.velocity_index.saturating_sub(1);
                self.target_velocity = state.ladder.speed(state.velocity_index);
            }
            Action::LaneLeft => {
                if let Some(target) = lane_index.checked_sub(1) {
                    if lanes.get(target).is_some_and(|l| l.is_reachable_from(position)) {
                        self.target_lane_index = target;
                    }
                }
            }
            Action::LaneRight => {
                let target = lane_index + 1;
                if lanes.get(target).is_some_and(|l| l.is_reachable_from(position)) {
                    self.target_lane_index = target;
                }
            }
            Action::Idle => {}
        }
    }

    // -------------------------------------------------------------------------
    // Kinematics
    // -------------------------------------------------------------------------

    /// Integrate the kinematic bicycle model over `dt` with the held controls.
    pub fn step(&mut self, dt: f64) {
        if self.is_obstacle() {
            self.control = Control::default();
            self.velocity = 0.0;
            return;
        }
        if self.crashed {
            self.control = Control {
                acceleration: -self.velocity,
                steering: 0.0,
            };
        }

        let (sin_h, cos_h) = self.heading.sin_cos();
        self.position[0] += self.velocity * cos_h * dt;
        self.position[1] += self.velocity * sin_h * dt;
        self.heading =
            wrap_to_pi(self.heading + self.velocity * self.control.steering.tan() / Self::LENGTH * dt);
        self.velocity = (self.velocity + self.control.acceleration * dt).max(0.0);
        self.lane_change_timer += dt;
    }

    /// Axis-aligned footprint overlap (headings stay small on a straight road).
    pub fn overlaps(&self, other: &Vehicle) -> bool {
        let dx = (self.position[0] - other.position[0]).abs();
        let dy = (self.position[1] - other.position[1]).abs();
        dx < Self::LENGTH && dy < Self::WIDTH
    }
}
