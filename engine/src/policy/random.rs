// engine/src/policy/random.rs
#![forbid(unsafe_code)]

use rand::prelude::*;

use crate::mdp::RoadMdp;

use super::base::Policy;

pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn choose_action(&mut self, mdp: &RoadMdp) -> Option<usize> {
        let ids = mdp.get_available_actions();
        let &aid = ids.choose(&mut self.rng)?;
        Some(aid)
    }
}
