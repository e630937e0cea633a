//! Negative log-likelihood of a transmitter track
//!
//! Four independent passes over one shared latent state:
//! - [`toa`]: observed arrival times against geometry, emission time and latency
//! - [`displacement`]: random-walk movement between consecutive pings
//! - [`latency`]: zero-mean prior on every latency residual
//! - [`burst`]: regularity of the ping schedule
//!
//! [`objective::TrackLikelihood`] sums them.

pub mod burst;
pub mod displacement;
pub mod gradient;
pub mod latency;
pub mod layout;
pub mod objective;
pub mod params;
pub mod state;
pub mod toa;

pub use gradient::{
    check_gradient, gradient_central_difference, gradient_forward, value_and_gradient,
    GradientCheck,
};
pub use layout::ParameterLayout;
pub use objective::{NllBreakdown, TrackLikelihood};
pub use params::{LogSigmas, Sigmas};
pub use state::LatentState;
