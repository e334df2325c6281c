// py/src/engine.rs
#![forbid(unsafe_code)]

use numpy::PyArray2;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use highway_engine::engine::{DEFAULT_ACTION_DURATION, DEFAULT_ACTION_TIMESTEP};
use highway_engine::{ACTION_DIM, ACTIONS, MdpConfig, RoadMdp, ScenarioConfig};

use crate::expert_policy::ExpertPolicy;
use crate::util::{OBS_FEATURES, mdp_err, observation_rows, parse_agent_kind, rows_to_pyarray2};

#[pyclass]
pub struct HighwayEnv {
    pub(crate) mdp: RoadMdp,
    // Stored defaults for reset() reuse:
    scenario: ScenarioConfig,
    timing: MdpConfig,
}

fn build(scenario: &ScenarioConfig, timing: MdpConfig, seed: u64) -> PyResult<RoadMdp> {
    let (road, ego) = scenario.build(seed);
    RoadMdp::from_config(road, ego, timing).map_err(mdp_err)
}

#[pymethods]
impl HighwayEnv {
    /// HighwayEnv(seed=12345, lanes=4, vehicles=20, vehicles_type="idm",
    ///            action_timestep=1/30, action_duration=1.0)
    ///
    /// Seeding notes:
    /// - The Rust simulation is deterministic given (seed, scenario, timing).
    /// - For RL training, the *Python* environment should generate a fresh episode seed
    ///   each reset and pass it explicitly.
    #[new]
    #[pyo3(signature = (
        seed=12345,
        lanes=4,
        vehicles=20,
        vehicles_type="idm",
        action_timestep=DEFAULT_ACTION_TIMESTEP,
        action_duration=DEFAULT_ACTION_DURATION,
    ))]
    fn new(
        seed: u64,
        lanes: usize,
        vehicles: usize,
        vehicles_type: &str,
        action_timestep: f64,
        action_duration: f64,
    ) -> PyResult<Self> {
        let scenario = ScenarioConfig {
            lanes_count: lanes,
            vehicles_count: vehicles,
            vehicles_type: parse_agent_kind(vehicles_type)?,
            ..ScenarioConfig::default()
        };
        let timing = MdpConfig {
            action_timestep,
            action_duration,
        };
        let mdp = build(&scenario, timing, seed)?;
        Ok(Self {
            mdp,
            scenario,
            timing,
        })
    }

    // ---------------------------------------------------------------------
    // Constants
    // ---------------------------------------------------------------------

    /// Fixed action-space dimension.
    fn action_dim(&self) -> usize {
        ACTION_DIM
    }

    /// actions() -> list[str], indexed by action id.
    fn actions(&self) -> Vec<&'static str> {
        ACTIONS.iter().map(|a| a.name()).collect()
    }

    /// Column names of `observation()`.
    fn observation_features(&self) -> Vec<&'static str> {
        OBS_FEATURES.to_vec()
    }

    fn tick_count(&self) -> usize {
        self.mdp.tick_count()
    }

    // ---------------------------------------------------------------------
    // Episode control
    // ---------------------------------------------------------------------

    /// reset(seed=None)
    ///
    /// IMPORTANT:
    /// - `seed` MUST be provided. If seed is None, this raises ValueError.
    /// - This is intentional: Gymnasium envs should generate an episode seed in Python and pass it in.
    #[pyo3(signature = (seed=None))]
    fn reset(&mut self, seed: Option<u64>) -> PyResult<()> {
        let seed = seed.ok_or_else(|| {
            PyValueError::new_err(
                "reset(seed=None) is not allowed. Pass an explicit episode seed (generated by the Python env).",
            )
        })?;
        self.mdp = build(&self.scenario, self.timing, seed)?;
        Ok(())
    }

    /// step(action) -> (reward, terminal)
    ///
    /// Raises ValueError for an action id outside [0, ACTION_DIM).
    fn step(&mut self, action: usize) -> PyResult<(f64, bool)> {
        let r = self.mdp.step(action).map_err(mdp_err)?;
        Ok((r, self.mdp.is_terminal()))
    }

    /// Convenience helper: compute expert action + step once.
    /// Returns (reward, terminal, action_id).
    ///
    /// If the expert has no action (terminal state), returns (0.0, True, None).
    fn step_expert(&mut self, policy: &mut ExpertPolicy) -> PyResult<(f64, bool, Option<usize>)> {
        let Some(aid) = policy.inner.action_id(&self.mdp) else {
            return Ok((0.0, true, None));
        };
        let (r, terminal) = self.step(aid)?;
        Ok((r, terminal, Some(aid)))
    }

    /// reward(action) -> float for the current state, without stepping.
    fn reward(&self, action: usize) -> PyResult<f64> {
        self.mdp.reward(action).map_err(mdp_err)
    }

    /// available_actions() -> list[int]
    fn available_actions(&self) -> Vec<usize> {
        self.mdp.get_available_actions()
    }

    fn is_terminal(&self) -> bool {
        self.mdp.is_terminal()
    }

    // ---------------------------------------------------------------------
    // Observation
    // ---------------------------------------------------------------------

    /// observation() -> float64[N, 5]
    ///
    /// One row per vehicle of the simplified view, ego first:
    /// [presence, dx, dy, velocity, lane].
    fn observation<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        rows_to_pyarray2(py, &observation_rows(&self.mdp))
    }

    /// ego_state() -> dict
    fn ego_state<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let ego = self.mdp.ego();
        let d = PyDict::new_bound(py);
        d.set_item("id", ego.id.0)?;
        d.set_item("x", ego.position[0])?;
        d.set_item("y", ego.position[1])?;
        d.set_item("heading", ego.heading)?;
        d.set_item("velocity", ego.velocity)?;
        d.set_item("target_velocity", ego.target_velocity)?;
        d.set_item("lane_index", ego.lane_index)?;
        d.set_item("target_lane_index", ego.target_lane_index)?;
        d.set_item("velocity_index", ego.velocity_index())?;
        d.set_item("speed_index", ego.speed_index())?;
        d.set_item("crashed", ego.crashed)?;
        d.set_item("time", self.mdp.road().time)?;
        d.set_item("timesteps", self.mdp.road().timesteps)?;
        Ok(d)
    }

    fn vehicles_count(&self) -> usize {
        self.mdp.road().vehicles.len()
    }

    fn render_ascii(&self) -> String {
        self.mdp.road().render_ascii(Some(self.mdp.ego_id()))
    }

    // ---------------------------------------------------------------------
    // State abstraction (in place)
    // ---------------------------------------------------------------------

    /// Drop traffic outside the planning window around the ego.
    fn simplify(&mut self) {
        self.mdp = self.mdp.simplified();
    }

    /// change_agents_to(kind): rebuild every non-ego, non-obstacle vehicle as
    /// "controlled" | "idm" | "linear".
    fn change_agents_to(&mut self, kind: &str) -> PyResult<()> {
        let kind = parse_agent_kind(kind)?;
        self.mdp = self.mdp.change_agents_to(&kind);
        Ok(())
    }

    /// Independent copy of the environment (for branching from Python).
    fn copy(&self) -> Self {
        Self {
            mdp: self.mdp.clone(),
            scenario: self.scenario.clone(),
            timing: self.timing,
        }
    }
}
