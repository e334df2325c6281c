// py/src/util.rs
#![forbid(unsafe_code)]

use numpy::PyArray2;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use highway_engine::{AgentKind, MdpError, RoadMdp};

/// Columns of one observation row.
pub(crate) const OBS_FEATURES: [&str; 5] = ["presence", "dx", "dy", "velocity", "lane"];

/// Engine errors surface in Python as ValueError.
pub(crate) fn mdp_err(e: MdpError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

pub(crate) fn parse_agent_kind(name: &str) -> PyResult<AgentKind> {
    name.parse::<AgentKind>().map_err(PyValueError::new_err)
}

/**
 * Ego-relative observation over the `simplified()` view, ego first.
 *
 * Row = [presence, dx, dy, velocity, lane]; dx/dy are relative to the ego,
 * velocity and lane are absolute.
 */
pub(crate) fn observation_rows(mdp: &RoadMdp) -> Vec<Vec<f64>> {
    let view = mdp.simplified();
    let ego = view.ego();

    let row = |v: &highway_engine::Vehicle| {
        vec![
            1.0,
            v.position[0] - ego.position[0],
            v.position[1] - ego.position[1],
            v.velocity,
            v.lane_index as f64,
        ]
    };

    let mut rows = Vec::with_capacity(view.road().vehicles.len());
    rows.push(row(ego));
    for v in view.road().vehicles.iter().filter(|v| v.id != ego.id) {
        rows.push(row(v));
    }
    rows
}

/**
 * Convert observation rows into a NumPy array of shape (N, OBS_FEATURES.len()).
 *
 * This intentionally copies into a Vec<Vec<f64>> for a simple, safe PyO3 surface.
 */
pub(crate) fn rows_to_pyarray2<'py>(
    py: Python<'py>,
    rows: &[Vec<f64>],
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    PyArray2::from_vec2_bound(py, rows).map_err(|e| {
        PyValueError::new_err(format!(
            "rows_to_pyarray2: failed to build numpy array from {} rows: {e}",
            rows.len()
        ))
    })
}
