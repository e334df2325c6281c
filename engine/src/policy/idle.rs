// engine/src/policy/idle.rs
#![forbid(unsafe_code)]

use crate::mdp::{Action, RoadMdp};

use super::base::Policy;

/// Keeps lane and speed; the baseline every other policy is compared against.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdlePolicy;

impl Policy for IdlePolicy {
    fn choose_action(&mut self, _mdp: &RoadMdp) -> Option<usize> {
        Some(Action::Idle.id())
    }
}
