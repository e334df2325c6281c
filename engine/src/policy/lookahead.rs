// engine/src/policy/lookahead.rs
#![forbid(unsafe_code)]

use crate::engine::AgentKind;
use crate::mdp::RoadMdp;
use crate::policy::base::Policy;
use crate::policy::beam::{BeamConfig, prune_top_n_scores};

/**
 * Depth-limited discounted search over the discrete MDP.
 *
 * Semantics:
 * - The search runs on `mdp.simplified()` (optionally rebuilt through
 *   `change_agents_to(agent_model)`), never on the caller's state.
 * - Q(s, a) = r(s, a) + gamma * V(s'), V = max over available actions,
 *   V = 0 at the horizon or in a terminal state.
 * - Ties keep the first action in `get_available_actions()` order.
 * - With a beam, only the top-N children by immediate reward are expanded
 *   at depths >= `beam_from_depth`.
 */
#[derive(Clone, Debug)]
pub struct LookaheadPolicy {
    depth: u8,
    gamma: f64,
    beam: Option<BeamConfig>,
    agent_model: Option<AgentKind>,
}

impl Default for LookaheadPolicy {
    fn default() -> Self {
        Self::new(2, 0.9)
    }
}

impl LookaheadPolicy {
    pub fn new(depth: u8, gamma: f64) -> Self {
        Self {
            depth: depth.max(1),
            gamma,
            beam: None,
            agent_model: None,
        }
    }

    pub fn with_beam(mut self, beam: Option<BeamConfig>) -> Self {
        self.beam = beam;
        self
    }

    /// Model the other drivers as `kind` during search.
    pub fn with_agent_model(mut self, kind: Option<AgentKind>) -> Self {
        self.agent_model = kind;
        self
    }

    #[inline]
    pub fn depth(&self) -> u8 {
        self.depth
    }

    #[inline]
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    #[inline]
    fn should_prune(&self, depth: u8) -> Option<usize> {
        let b = self.beam?;
        if depth >= b.beam_from_depth {
            Some(b.beam_width.max(1))
        } else {
            None
        }
    }

    /// Root state of the search.
    fn abstraction(&self, mdp: &RoadMdp) -> RoadMdp {
        let simple = mdp.simplified();
        match self.agent_model {
            Some(kind) => simple.change_agents_to(&kind),
            None => simple,
        }
    }

    /// One ply: (action, immediate reward, successor) for every available action,
    /// pruned to the beam at this depth.
    fn expand(&self, state: &RoadMdp, depth: u8) -> Vec<(usize, f64, RoadMdp)> {
        let mut children = Vec::new();
        for aid in state.get_available_actions() {
            let mut next = state.clone();
            let Ok(r) = next.step(aid) else {
                continue;
            };
            children.push((aid, r, next));
        }

        let Some(n) = self.should_prune(depth) else {
            return children;
        };

        let scores = children
            .iter()
            .enumerate()
            .map(|(i, c)| (i, c.1))
            .collect::<Vec<_>>();
        let mut keep = prune_top_n_scores(scores, n)
            .into_iter()
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        // Back to available-action order so ties resolve the same way with or without a beam.
        keep.sort_unstable();

        let mut slots = children.into_iter().map(Some).collect::<Vec<_>>();
        keep.into_iter()
            .filter_map(|i| slots[i].take())
            .collect()
    }

    fn value(&self, state: &RoadMdp, plies_left: u8, depth: u8) -> f64 {
        if plies_left == 0 || state.is_terminal() {
            return 0.0;
        }

        let mut best = f64::NEG_INFINITY;
        for (_aid, r, next) in self.expand(state, depth) {
            let q = r + self.gamma * self.value(&next, plies_left - 1, depth + 1);
            if q > best {
                best = q;
            }
        }
        if best.is_finite() { best } else { 0.0 }
    }

    /// Q-values of the root actions, in available-action order.
    pub fn action_values(&self, mdp: &RoadMdp) -> Vec<(usize, f64)> {
        if mdp.is_terminal() {
            return Vec::new();
        }

        let root = self.abstraction(mdp);
        self.expand(&root, 0)
            .into_iter()
            .map(|(aid, r, next)| (aid, r + self.gamma * self.value(&next, self.depth - 1, 1)))
            .collect()
    }
}

impl Policy for LookaheadPolicy {
    fn choose_action(&mut self, mdp: &RoadMdp) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (aid, q) in self.action_values(mdp) {
            if best.is_none_or(|(_, b)| q > b) {
                best = Some((aid, q));
            }
        }

        let (aid, q) = best?;
        log::trace!("lookahead: action={} q={:.3}", aid, q);
        Some(aid)
    }
}
