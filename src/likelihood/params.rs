//! Fixed-effect parameters.
//!
//! Every variance-type parameter lives in unconstrained log space and is
//! exponentiated at the point of use, so an optimizer can move freely over
//! the real line while the model only ever sees positive spreads.

use serde::{Deserialize, Serialize};

use crate::autodiff::Scalar;

/// Number of fixed-effect log-parameters
pub const N_LOG_SIGMAS: usize = 6;

/// Names of the fixed-effect log-parameters, in flat-vector order
pub const LOG_SIGMA_NAMES: [&str; N_LOG_SIGMAS] = [
    "log_sigma_bi",
    "log_sigma_dl",
    "log_sigma_toa",
    "log_sigma_x",
    "log_sigma_y",
    "log_sigma_z",
];

/// Unconstrained log-parameters, as seen by the optimizer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogSigmas<S> {
    /// Burst-interval irregularity (log sd)
    pub bi: S,
    /// Hydrophone latency residual (log sd)
    pub dl: S,
    /// Arrival-time residual (log sd)
    pub toa: S,
    /// Displacement variance rate per second, x axis (log)
    pub x: S,
    pub y: S,
    pub z: S,
}

/// Natural-scale parameters, strictly positive unless a log-parameter underflowed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sigmas<S> {
    pub bi: S,
    pub dl: S,
    pub toa: S,
    pub x: S,
    pub y: S,
    pub z: S,
}

impl<S: Scalar> Sigmas<S> {
    /// Per-axis displacement variance rates `[x, y, z]`
    #[inline]
    pub fn displacement_rates(&self) -> [S; 3] {
        [self.x, self.y, self.z]
    }
}

impl<S: Scalar> LogSigmas<S> {
    pub fn new(bi: S, dl: S, toa: S, x: S, y: S, z: S) -> Self {
        Self { bi, dl, toa, x, y, z }
    }

    /// All log-parameters at zero, i.e. every sigma equal to one
    pub fn zeros() -> Self {
        Self::from_array([S::zero(); N_LOG_SIGMAS])
    }

    pub fn from_array(values: [S; N_LOG_SIGMAS]) -> Self {
        let [bi, dl, toa, x, y, z] = values;
        Self { bi, dl, toa, x, y, z }
    }

    pub fn to_array(&self) -> [S; N_LOG_SIGMAS] {
        [self.bi, self.dl, self.toa, self.x, self.y, self.z]
    }

    /// Exponentiate into natural scale
    #[inline]
    pub fn sigmas(&self) -> Sigmas<S> {
        Sigmas {
            bi: self.bi.exp(),
            dl: self.dl.exp(),
            toa: self.toa.exp(),
            x: self.x.exp(),
            y: self.y.exp(),
            z: self.z.exp(),
        }
    }
}

impl LogSigmas<f64> {
    /// Log-transform natural-scale values, e.g. from prior knowledge of the array
    pub fn from_natural(bi: f64, dl: f64, toa: f64, x: f64, y: f64, z: f64) -> Self {
        Self::new(bi.ln(), dl.ln(), toa.ln(), x.ln(), y.ln(), z.ln())
    }

    /// Promote to another scalar type as constants
    pub fn lift<S: Scalar>(&self) -> LogSigmas<S> {
        LogSigmas::from_array(self.to_array().map(S::from_f64))
    }
}
