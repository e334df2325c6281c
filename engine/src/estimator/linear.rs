// engine/src/estimator/linear.rs
#![forbid(unsafe_code)]

use crate::engine::{LINEAR_FEATURES, Road, VehicleId, linear_features};
use crate::mdp::MdpError;

/// Default learning rate.
pub const RHO: f64 = 0.01;

/**
 * Online least-mean-squares estimate of a linear acceleration model
 * `a = w . phi`.
 *
 * Update rule (one observation over `dt`):
 *     w <- w + rate * phi * (a - phi . w) * dt
 *
 * Weights start at zero; with persistently exciting features and a small
 * enough `rate * dt * |phi|^2` the weights converge to the true parameters.
 */
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearEstimator {
    weights: [f64; LINEAR_FEATURES],
    rate: f64,
}

impl Default for LinearEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearEstimator {
    pub fn new() -> Self {
        Self::with_rate(RHO)
    }

    pub fn with_rate(rate: f64) -> Self {
        Self {
            weights: [0.0; LINEAR_FEATURES],
            rate,
        }
    }

    #[inline]
    pub fn weights(&self) -> [f64; LINEAR_FEATURES] {
        self.weights
    }

    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    #[inline]
    pub fn predict(&self, features: &[f64; LINEAR_FEATURES]) -> f64 {
        self.weights.iter().zip(features).map(|(w, f)| w * f).sum()
    }

    /// Apply one update; returns the prediction error before the update.
    pub fn observe(&mut self, features: &[f64; LINEAR_FEATURES], response: f64, dt: f64) -> f64 {
        let error = response - self.predict(features);
        for (w, f) in self.weights.iter_mut().zip(features) {
            *w += self.rate * f * error * dt;
        }
        error
    }

    /**
     * Observe vehicle `id` on `road`: features of the current state against the
     * acceleration it applies this tick.
     *
     * Call after `road.act()` and before `road.step(dt)` so that features and
     * control refer to the same state.
     */
    pub fn update(&mut self, road: &Road, id: VehicleId, dt: f64) -> Result<f64, MdpError> {
        let features = linear_features(road, id).ok_or(MdpError::UnknownVehicle(id))?;
        let response = road
            .vehicle(id)
            .ok_or(MdpError::UnknownVehicle(id))?
            .control
            .acceleration;
        Ok(self.observe(&features, response, dt))
    }
}
