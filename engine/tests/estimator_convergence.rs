// engine/tests/estimator_convergence.rs
#![forbid(unsafe_code)]

/**
 * Tests for the online linear acceleration estimator.
 *
 * Purpose:
 * - Check the LMS update arithmetic and its convergence on noise-free data.
 * - Check the road-facing `update` reads the features and the applied control.
 *
 * How the tests work:
 * - Synthetic features from a seeded StdRng with a known weight vector.
 * - A tiny road with one linear driver behind a leader.
 */
use highway_engine::engine::{LINEAR_FEATURES, LinearParams, linear_features};
use highway_engine::estimator::RHO;
use highway_engine::{LinearEstimator, MdpError, Road, VehicleId};
use rand::prelude::*;

const DT: f64 = 1.0 / 30.0;

#[test]
fn new_estimator_starts_at_zero_with_default_rate() {
    let est = LinearEstimator::new();
    assert_eq!(est.weights(), [0.0; LINEAR_FEATURES]);
    assert_eq!(est.rate(), RHO);
    assert_eq!(est.predict(&[1.0, 2.0, 3.0]), 0.0);
}

#[test]
fn observe_applies_one_lms_step_and_returns_the_error() {
    let mut est = LinearEstimator::with_rate(0.5);

    let err = est.observe(&[1.0, 0.0, -2.0], 4.0, 0.5);

    assert_eq!(err, 4.0);
    // w += 0.5 * f * 4 * 0.5
    assert_eq!(est.weights(), [1.0, 0.0, -2.0]);
    assert_eq!(est.predict(&[1.0, 0.0, -2.0]), 5.0);
}

#[test]
fn converges_to_known_weights_on_noise_free_data() {
    let truth = [1.0, 2.0, 1.0];
    let mut est = LinearEstimator::with_rate(0.5);
    let mut rng = StdRng::seed_from_u64(7);

    let mut last_err = f64::INFINITY;
    for _ in 0..2000 {
        let f: [f64; LINEAR_FEATURES] = std::array::from_fn(|_| rng.gen_range(-1.0..1.0));
        let response: f64 = truth.iter().zip(&f).map(|(w, x)| w * x).sum();
        last_err = est.observe(&f, response, 1.0);
    }

    for (w, t) in est.weights().iter().zip(truth) {
        assert!((w - t).abs() < 1e-2, "w={w} truth={t}");
    }
    assert!(last_err.abs() < 1e-2);
}

#[test]
fn update_reads_features_and_applied_acceleration() {
    let mut road = Road::straight(1, 4.0);
    let driver = road.spawn_linear(0, 0.0, 25.0);
    road.vehicle_mut(driver).expect("spawned").target_velocity = 28.0;
    road.spawn_idm(0, 30.0, 22.0);

    road.act();
    let applied = road.vehicle(driver).expect("spawned").control.acceleration;
    let f = linear_features(&road, driver).expect("on road");
    assert_eq!(applied, LinearParams::default().acceleration(&f));

    let mut est = LinearEstimator::new();
    let err = est.update(&road, driver, DT).expect("on road");
    assert_eq!(err, applied);
    for (w, x) in est.weights().iter().zip(f) {
        assert_eq!(*w, RHO * x * applied * DT);
    }
}

#[test]
fn update_rejects_unknown_vehicles() {
    let road = Road::straight(1, 4.0);
    let mut est = LinearEstimator::new();
    assert_eq!(
        est.update(&road, VehicleId(3), DT),
        Err(MdpError::UnknownVehicle(VehicleId(3)))
    );
    assert_eq!(est.weights(), [0.0; LINEAR_FEATURES]);
}
