// engine/src/lib.rs
#![forbid(unsafe_code)]

pub mod engine;
pub mod estimator;
pub mod mdp;
pub mod policy;

// Re-export the bits the CLI and the Python bindings need:
pub use engine::{AgentFactory, AgentKind, Road, ScenarioConfig, Vehicle, VehicleId};
pub use estimator::LinearEstimator;
pub use mdp::{ACTION_DIM, ACTIONS, ACTIONS_INDEXES, Action, MdpConfig, MdpError, RoadMdp};
