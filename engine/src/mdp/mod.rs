// engine/src/mdp/mod.rs
#![forbid(unsafe_code)]

mod actions;
mod error;
mod road_mdp;

/**
 * Curated MDP public API.
 *
 * Internal implementation modules remain private; only stable items are re-exported here.
 */
pub use actions::{ACTION_DIM, ACTIONS, ACTIONS_INDEXES, Action};
pub use error::MdpError;
pub use road_mdp::{MdpConfig, RoadMdp};
