// py/src/lib.rs
#![forbid(unsafe_code)]
#![allow(unsafe_op_in_unsafe_fn)] // pyo3 macro-generated glue triggers this on Rust 2024

mod engine;
mod expert_policy;
mod util;

use pyo3::prelude::*;

use crate::engine::HighwayEnv;
use crate::expert_policy::ExpertPolicy;

#[pymodule]
fn highway_rl_engine(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<HighwayEnv>()?;
    m.add_class::<ExpertPolicy>()?;
    m.add("ACTION_DIM", highway_engine::ACTION_DIM)?;
    m.add(
        "ACTIONS",
        highway_engine::ACTIONS
            .iter()
            .map(|a| a.name())
            .collect::<Vec<_>>(),
    )?;
    Ok(())
}
