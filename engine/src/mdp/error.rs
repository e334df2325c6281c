// engine/src/mdp/error.rs
#![forbid(unsafe_code)]

use thiserror::Error;

use crate::engine::VehicleId;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum MdpError {
    #[error("invalid action id {0} (expected 0..5)")]
    InvalidAction(usize),

    #[error("unknown action name {0:?}")]
    UnknownActionName(String),

    #[error("vehicle {0} is not on the road")]
    UnknownVehicle(VehicleId),

    #[error("vehicle {0} is not a controlled vehicle")]
    NotControlled(VehicleId),

    #[error(
        "invalid action timing: timestep={action_timestep}, duration={action_duration} \
         (need a positive timestep and at least one tick per action)"
    )]
    InvalidTiming {
        action_timestep: f64,
        action_duration: f64,
    },
}
