//! Log-densities used by the likelihood passes, generic over [`Scalar`](crate::autodiff::Scalar)

pub mod normal;
pub mod residual;
pub mod student_t;

pub use residual::{Gaussian, GaussianStudentMixture, ResidualDensity, ResidualModel};
