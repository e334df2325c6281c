// engine/src/engine/mod.rs
#![forbid(unsafe_code)]

mod agents;
mod behavior;
pub mod constants;
mod features;
mod lane;
mod road;
mod scenario;
mod vehicle;

/**
 * Curated simulation public API.
 *
 * Internal implementation modules remain private; only stable items are re-exported here.
 */
pub use agents::{AgentFactory, AgentKind};
pub use behavior::{
    Behavior, ControlledState, IdmParams, LinearParams, SpeedLadder, steering_control,
    velocity_control,
};
pub use constants::{
    DEFAULT_ACTION_DURATION, DEFAULT_ACTION_TIMESTEP, DEFAULT_LANE_WIDTH, SPEED_COUNT, SPEED_MAX,
    SPEED_MIN,
};
pub use features::{LINEAR_FEATURES, linear_features, position_feature, velocity_feature};
pub use lane::{Lane, Position, closest_lane_index};
pub use road::Road;
pub use scenario::ScenarioConfig;
pub use vehicle::{Control, Vehicle, VehicleId};
