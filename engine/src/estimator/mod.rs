// engine/src/estimator/mod.rs
#![forbid(unsafe_code)]

mod linear;

pub use linear::{LinearEstimator, RHO};
