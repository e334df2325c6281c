// engine/src/policy/base.rs
#![forbid(unsafe_code)]

use crate::mdp::RoadMdp;

/// Policy chooses the next ego action for the current MDP state.
///
/// Returns an action id in `[0, ACTION_DIM)`, or `None` if the policy has
/// nothing to do (e.g. the state is terminal).
///
/// Object-safe so it can be used as `Box<dyn Policy>`.
pub trait Policy {
    fn choose_action(&mut self, mdp: &RoadMdp) -> Option<usize>;
}
