// engine/src/engine/constants.rs
#![forbid(unsafe_code)]

use std::f64::consts::FRAC_PI_4;

// -----------------------------------------------------------------------------
// Road geometry
// -----------------------------------------------------------------------------

pub const DEFAULT_LANE_WIDTH: f64 = 4.0;
pub const DEFAULT_ROAD_LENGTH: f64 = 10_000.0;
/// x where lanes begin; traffic may be spawned behind the ego at x = 0.
pub const DEFAULT_ROAD_START: f64 = -1_000.0;

// -----------------------------------------------------------------------------
// Vehicle body
// -----------------------------------------------------------------------------

pub const VEHICLE_LENGTH: f64 = 5.0;
pub const VEHICLE_WIDTH: f64 = 2.0;

/// Range used when drawing initial velocities for random traffic.
pub const DEFAULT_VELOCITIES: (f64, f64) = (20.0, 30.0);

// -----------------------------------------------------------------------------
// Low-level controllers
// -----------------------------------------------------------------------------

/// Longitudinal time constant [s].
pub const TAU_A: f64 = 0.1;
/// Lateral (heading) time constant [s].
pub const TAU_DS: f64 = 0.2;

pub const KP_A: f64 = 1.0 / TAU_A;
pub const KP_HEADING: f64 = 1.0 / TAU_DS;
pub const KP_LATERAL: f64 = KP_HEADING / 3.0;

pub const MAX_STEERING_ANGLE: f64 = FRAC_PI_4;

// -----------------------------------------------------------------------------
// Discrete speed ladder for controlled (MDP) vehicles
// -----------------------------------------------------------------------------

pub const SPEED_COUNT: usize = 3;
pub const SPEED_MIN: f64 = 20.0;
pub const SPEED_MAX: f64 = 30.0;

// -----------------------------------------------------------------------------
// Default MDP timing
// -----------------------------------------------------------------------------

pub const DEFAULT_ACTION_TIMESTEP: f64 = 1.0 / 30.0;
pub const DEFAULT_ACTION_DURATION: f64 = 1.0;

/// Avoid dividing by a vanishing velocity in the steering controller.
#[inline]
pub(crate) fn not_zero(x: f64) -> f64 {
    const EPS: f64 = 1e-2;
    if x.abs() > EPS {
        x
    } else if x >= 0.0 {
        EPS
    } else {
        -EPS
    }
}

/// Wrap an angle to (-pi, pi].
#[inline]
pub(crate) fn wrap_to_pi(x: f64) -> f64 {
    use std::f64::consts::PI;
    let y = (x + PI).rem_euclid(2.0 * PI) - PI;
    if y <= -PI { y + 2.0 * PI } else { y }
}
