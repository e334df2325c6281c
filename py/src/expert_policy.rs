// py/src/expert_policy.rs
#![forbid(unsafe_code)]

use pyo3::prelude::*;

use highway_engine::RoadMdp;
use highway_engine::policy::{BeamConfig, IdlePolicy, LookaheadPolicy, Policy, RandomPolicy};

use crate::engine::HighwayEnv;
use crate::util::parse_agent_kind;

#[pyclass]
pub struct ExpertPolicy {
    pub(crate) inner: ExpertPolicyInner,
}

pub(crate) enum ExpertPolicyInner {
    Lookahead(LookaheadPolicy),
    Random(RandomPolicy),
    Idle(IdlePolicy),
}

impl ExpertPolicyInner {
    pub(crate) fn action_id(&mut self, mdp: &RoadMdp) -> Option<usize> {
        match self {
            ExpertPolicyInner::Lookahead(p) => Policy::choose_action(p, mdp),
            ExpertPolicyInner::Random(p) => Policy::choose_action(p, mdp),
            ExpertPolicyInner::Idle(p) => Policy::choose_action(p, mdp),
        }
    }
}

#[pymethods]
impl ExpertPolicy {
    /// Depth-limited lookahead planner. Optional beam pruning and traffic model.
    #[staticmethod]
    #[pyo3(signature = (depth=2, gamma=0.9, beam_width=None, beam_from_depth=0, agent_model=None))]
    fn lookahead(
        depth: u8,
        gamma: f64,
        beam_width: Option<usize>,
        beam_from_depth: u8,
        agent_model: Option<&str>,
    ) -> PyResult<Self> {
        let beam = beam_width.map(|w| BeamConfig::new(beam_from_depth, w));
        let model = agent_model.map(parse_agent_kind).transpose()?;
        Ok(Self {
            inner: ExpertPolicyInner::Lookahead(
                LookaheadPolicy::new(depth, gamma)
                    .with_beam(beam)
                    .with_agent_model(model),
            ),
        })
    }

    /// Uniform choice among the available actions.
    #[staticmethod]
    #[pyo3(signature = (seed=12345))]
    fn random(seed: u64) -> Self {
        Self {
            inner: ExpertPolicyInner::Random(RandomPolicy::new(seed)),
        }
    }

    #[staticmethod]
    fn idle() -> Self {
        Self {
            inner: ExpertPolicyInner::Idle(IdlePolicy),
        }
    }

    /// Compute an action id for the current state of `env`.
    ///
    /// NOTE: This borrows the env state (no copies).
    fn action_id(&mut self, env: &HighwayEnv) -> Option<usize> {
        self.inner.action_id(&env.mdp)
    }
}
