// highway_cli/src/fit.rs
#![forbid(unsafe_code)]

/*
Online fit of the linear driver model
-------------------------------------

A road is filled with linear drivers (a = theta . phi). The vehicle in the
middle of the platoon is observed every tick and a LinearEstimator learns
theta from its features and applied accelerations. Lane changes of the
observed vehicle are disabled so that its neighbourhood stays in one lane.

Excitation
- Every `retarget_s` seconds each driver draws a new target velocity from
  DEFAULT_VELOCITIES, so the speed feature never settles at 0 and the platoon
  keeps closing and opening gaps.

Samples
- A tick is only fed to the estimator when the observed vehicle is intact and
  its acceleration is below `acc_max`; clamped controls are not `theta . phi`.

Tick order: retarget -> road.act() -> estimator.update() -> road.step(dt)
*/

use std::time::Instant;

use anyhow::{Context, Result, bail, ensure};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use highway_engine::engine::constants::DEFAULT_VELOCITIES;
use highway_engine::engine::{Behavior, LINEAR_FEATURES};
use highway_engine::{AgentKind, LinearEstimator, Road, ScenarioConfig};

#[derive(Clone, Debug)]
pub struct FitConfig {
    /// Simulation ticks to run.
    pub steps: u64,
    pub seed: u64,
    pub lanes: usize,
    pub vehicles: usize,
    /// Tick duration [s].
    pub dt: f64,
    /// Estimator learning rate.
    pub rate: f64,
    /// Period of the target velocity re-draw [s].
    pub retarget_s: f64,
    /// Log the weights every N ticks (0 disables).
    pub log_every: u64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            steps: 30_000,
            seed: 0,
            lanes: 1,
            vehicles: 5,
            dt: 1.0 / 30.0,
            rate: 0.1,
            retarget_s: 5.0,
            log_every: 1000,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FitReport {
    pub steps_done: u64,
    /// Ticks actually fed to the estimator.
    pub samples: u64,
    pub elapsed_s: f64,
    pub weights: [f64; LINEAR_FEATURES],
    pub truth: [f64; LINEAR_FEATURES],
    /// Mean |prediction error| over the samples of the last tenth of the run.
    pub tail_abs_error: f64,
}

impl FitReport {
    pub fn weight_error(&self) -> f64 {
        self.weights
            .iter()
            .zip(&self.truth)
            .map(|(w, t)| (w - t).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

pub fn run_fit(cfg: &FitConfig) -> Result<FitReport> {
    ensure!(cfg.dt > 0.0, "--dt must be positive (got {})", cfg.dt);
    ensure!(
        cfg.retarget_s > 0.0,
        "--retarget must be positive (got {})",
        cfg.retarget_s
    );

    let scenario = ScenarioConfig {
        lanes_count: cfg.lanes,
        vehicles_count: cfg.vehicles,
        vehicles_type: AgentKind::Linear,
        ..ScenarioConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut road = Road::create_random_road(&scenario, &mut rng);

    let middle = road.vehicles.len() / 2;
    let Some(observed) = road.vehicles.get_mut(middle) else {
        bail!("fit needs at least one vehicle (got --vehicles {})", cfg.vehicles);
    };
    observed.enable_lane_change = false;
    let id = observed.id;
    let (truth, acc_max) = match observed.behavior {
        Behavior::Linear(p) => (p.theta, p.idm.acc_max),
        other => bail!("observed vehicle {} is {}, expected linear", id, other.name()),
    };

    log::info!(
        "fit: observing vehicle {} among {} on {} lanes, dt={} rate={} retarget={}s",
        id,
        road.vehicles.len(),
        road.lanes_count(),
        cfg.dt,
        cfg.rate,
        cfg.retarget_s
    );

    let t0 = Instant::now();
    let retarget_every = ((cfg.retarget_s / cfg.dt).round() as u64).max(1);
    let (v_lo, v_hi) = DEFAULT_VELOCITIES;
    let mut estimator = LinearEstimator::with_rate(cfg.rate);
    let tail_from = cfg.steps - cfg.steps / 10;
    let mut samples = 0u64;
    let mut tail_sum = 0.0;
    let mut tail_n = 0u64;

    for step in 0..cfg.steps {
        if step % retarget_every == 0 {
            for v in &mut road.vehicles {
                v.target_velocity = rng.gen_range(v_lo..v_hi);
            }
        }

        road.act();

        let Some(v) = road.vehicle(id) else {
            bail!("observed vehicle {id} left the road at tick {step}");
        };
        if !v.crashed && v.control.acceleration.abs() < acc_max {
            let err = estimator
                .update(&road, id, cfg.dt)
                .with_context(|| format!("Estimator update at tick {step}"))?;
            samples += 1;
            if step >= tail_from {
                tail_sum += err.abs();
                tail_n += 1;
            }
        }

        road.step(cfg.dt);

        let w = estimator.weights();
        ensure!(
            w.iter().all(|x| x.is_finite()),
            "estimator diverged at tick {step}: weights={w:?}; lower --rate or --dt"
        );

        if cfg.log_every > 0 && (step + 1) % cfg.log_every == 0 {
            log::info!(
                "t={:.2} weights=[{:.4}, {:.4}, {:.4}] samples={}",
                road.time,
                w[0],
                w[1],
                w[2],
                samples
            );
        }
    }

    Ok(FitReport {
        steps_done: cfg.steps,
        samples,
        elapsed_s: t0.elapsed().as_secs_f64(),
        weights: estimator.weights(),
        truth,
        tail_abs_error: if tail_n > 0 {
            tail_sum / tail_n as f64
        } else {
            0.0
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platoon_fit_recovers_the_driver_weights() {
        let cfg = FitConfig {
            seed: 2,
            log_every: 0,
            ..FitConfig::default()
        };

        let report = run_fit(&cfg).expect("fit runs");

        assert_eq!(report.steps_done, 30_000);
        assert!(report.samples > report.steps_done / 2, "samples={}", report.samples);
        assert!(
            report.weight_error() < 0.25,
            "weights={:?} truth={:?}",
            report.weights,
            report.truth
        );
        assert!((report.weights[0] - report.truth[0]).abs() < 0.05);
    }

    #[test]
    fn retargeting_keeps_the_speed_feature_excited() {
        let cfg = FitConfig {
            steps: 3_000,
            log_every: 0,
            ..FitConfig::default()
        };

        let report = run_fit(&cfg).expect("fit runs");

        assert!(report.weights[0] > 0.05, "weights={:?}", report.weights);
    }

    #[test]
    fn fit_rejects_an_empty_road_and_bad_timing() {
        let empty = FitConfig {
            vehicles: 0,
            ..FitConfig::default()
        };
        let err = run_fit(&empty).expect_err("no vehicle to observe");
        assert!(err.to_string().contains("at least one vehicle"));

        let bad_dt = FitConfig {
            dt: 0.0,
            ..FitConfig::default()
        };
        assert!(run_fit(&bad_dt).is_err());

        let bad_retarget = FitConfig {
            retarget_s: 0.0,
            ..FitConfig::default()
        };
        assert!(run_fit(&bad_retarget).is_err());
    }
}
