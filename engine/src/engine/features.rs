// engine/src/engine/features.rs
#![forbid(unsafe_code)]

use crate::engine::behavior::IdmParams;
use crate::engine::road::Road;
use crate::engine::vehicle::{Vehicle, VehicleId};

pub const LINEAR_FEATURES: usize = 3;

/// Penalises closing in on a slower leader or being closed in on by a faster follower.
///
/// `dp` is the signed gap to the neighbour, `dv` its velocity minus ours.
/// A neighbour level with us (`dp == 0`) contributes nothing.
#[inline]
pub fn velocity_feature(dp: f64, dv: f64) -> f64 {
    if dp == 0.0 {
        return 0.0;
    }
    let sign = dp.signum();
    (sign * dv).min(0.0) * sign
}

/// Penetration of the neighbour into the safe distance.
///
/// Negative for a leader (`dp > 0`, uses our velocity `vi`), positive for a
/// follower (uses its velocity `vj`).
pub fn position_feature(dp: f64, vi: f64, vj: f64) -> f64 {
    let idm = IdmParams::default();
    let safe = |v: f64| Vehicle::LENGTH + idm.distance_wanted + v * idm.time_wanted;
    if dp > 0.0 {
        -(safe(vi) - dp.abs()).max(0.0)
    } else {
        (safe(vj) - dp.abs()).max(0.0)
    }
}

/**
 * Linear acceleration features of vehicle `i`:
 *
 * - `[0]`: target velocity minus velocity
 * - `[1]`: `velocity_feature` summed over the front and rear neighbours
 * - `[2]`: `position_feature` summed over the front and rear neighbours
 *
 * Neighbours are taken in the vehicle's current lane.
 */
pub(crate) fn linear_features_at(road: &Road, i: usize) -> [f64; LINEAR_FEATURES] {
    let v = &road.vehicles[i];
    let mut f = [v.target_velocity - v.velocity, 0.0, 0.0];

    let (front, rear) = road.neighbour_indices(i, v.lane_index);
    for j in [front, rear].into_iter().flatten() {
        let other = &road.vehicles[j];
        let dp = v.lane_distance_to(other);
        let dv = other.velocity - v.velocity;
        f[1] += velocity_feature(dp, dv);
        f[2] += position_feature(dp, v.velocity, other.velocity);
    }
    f
}

/// Linear acceleration features of vehicle `id`, `None` if it is not on the road.
pub fn linear_features(road: &Road, id: VehicleId) -> Option<[f64; LINEAR_FEATURES]> {
    road.index_of(id).map(|i| linear_features_at(road, i))
}
