//! Hydrophone Track Likelihood
//!
//! Negative log-likelihood of a hierarchical state-space model that
//! reconstructs the 3D track of an acoustic transmitter from the times its
//! pings arrive at an array of stationary hydrophones.
//!
//! The objective is written once over [`autodiff::Scalar`], so the same code
//! yields the value (`f64`) and exact derivatives ([`autodiff::Dual`]) for
//! an external optimizer.

pub mod core;
pub mod autodiff;
pub mod density;
pub mod likelihood;
pub mod validation;
pub mod utils;

// Re-export commonly used types
pub use core::{
    ArrivalTable, Detection, Hydrophone, HydrophoneArray, TrackData, MISSING_TOA_SENTINEL,
    SPEED_OF_SOUND_WATER,
};
pub use autodiff::{Dual, Scalar};
pub use density::{Gaussian, GaussianStudentMixture, ResidualDensity, ResidualModel};
pub use likelihood::{
    check_gradient, gradient_central_difference, gradient_forward, value_and_gradient,
    GradientCheck, LatentState, LogSigmas, NllBreakdown, ParameterLayout, Sigmas,
    TrackLikelihood,
};
pub use validation::{DataValidator, ModelError, ValidationReport};
pub use utils::{ConfigurationManager, ModelConfig};
