//! Arrival-time residual distributions.
//!
//! The TOA pass only ever asks for `-log p(eps; sigma_toa)`; geometry and
//! missing-data handling stay in the pass, so swapping the distribution
//! here never touches them.

use serde::{Deserialize, Serialize};

use crate::autodiff::Scalar;
use crate::core::DEFAULT_STUDENT_T_DOF;
use crate::density::{normal, student_t};

/// Density of the residual `eps = observed - expected` arrival time.
pub trait ResidualDensity: Send + Sync {
    /// `-log p(eps)` given the TOA standard deviation `sigma`.
    fn neg_log_density<S: Scalar>(&self, eps: S, sigma: S) -> S;
}

/// Zero-mean normal residuals. This is the default model.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Gaussian;

impl ResidualDensity for Gaussian {
    #[inline]
    fn neg_log_density<S: Scalar>(&self, eps: S, sigma: S) -> S {
        normal::nll(eps, S::zero(), sigma)
    }
}

/// Two-component mixture of a normal and a scaled Student-t, for tracks
/// with occasional multipath detections far from the expected arrival.
///
/// `-ln( (1-p)·N(eps; 0, sigma) + p·t_dof(eps/s)/s )` with `p = exp(log_t_part)`
/// and `s = exp(log_scale)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianStudentMixture {
    pub log_scale: f64,
    pub log_t_part: f64,
    pub dof: f64,
}

impl GaussianStudentMixture {
    pub fn new(log_scale: f64, log_t_part: f64) -> Self {
        Self { log_scale, log_t_part, dof: DEFAULT_STUDENT_T_DOF }
    }

    /// Weight of the Student-t component
    pub fn t_part(&self) -> f64 {
        self.log_t_part.exp()
    }
}

impl ResidualDensity for GaussianStudentMixture {
    fn neg_log_density<S: Scalar>(&self, eps: S, sigma: S) -> S {
        let t_part = S::from_f64(self.log_t_part).exp();
        let gaussian_part = S::from_f64(1.0) - t_part;
        let scale = S::from_f64(self.log_scale).exp();
        let one = S::from_f64(1.0);

        let gaussian = normal::logpdf(eps, S::zero(), sigma).exp();
        let heavy = student_t::logpdf(eps / scale, S::zero(), one, self.dof).exp() / scale;

        -(gaussian_part * gaussian + t_part * heavy).ln()
    }
}

/// Residual model selected through configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResidualModel {
    #[default]
    Gaussian,
    StudentMixture {
        log_scale: f64,
        log_t_part: f64,
        #[serde(default = "default_dof")]
        dof: f64,
    },
}

fn default_dof() -> f64 {
    DEFAULT_STUDENT_T_DOF
}

impl ResidualDensity for ResidualModel {
    #[inline]
    fn neg_log_density<S: Scalar>(&self, eps: S, sigma: S) -> S {
        match *self {
            ResidualModel::Gaussian => Gaussian.neg_log_density(eps, sigma),
            ResidualModel::StudentMixture { log_scale, log_t_part, dof } => {
                GaussianStudentMixture { log_scale, log_t_part, dof }.neg_log_density(eps, sigma)
            }
        }
    }
}
