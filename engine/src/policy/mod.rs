// engine/src/policy/mod.rs
#![forbid(unsafe_code)]

mod base;
mod beam;
mod idle;
mod lookahead;
mod random;

/**
 * Curated policy public API.
 *
 * Internal implementation modules remain private; only stable policy entrypoints are re-exported.
 */
pub use base::Policy;
pub use beam::BeamConfig;
pub use idle::IdlePolicy;
pub use lookahead::LookaheadPolicy;
pub use random::RandomPolicy;
