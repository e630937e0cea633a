//! Objective assembly: the total negative log-likelihood of one track.

use crate::autodiff::Scalar;
use crate::core::TrackData;
use crate::density::{Gaussian, ResidualDensity, ResidualModel};
use crate::likelihood::burst::burst_nll;
use crate::likelihood::displacement::displacement_nll;
use crate::likelihood::latency::latency_nll;
use crate::likelihood::layout::ParameterLayout;
use crate::likelihood::params::{LogSigmas, Sigmas};
use crate::likelihood::state::LatentState;
use crate::likelihood::toa::toa_nll;
use crate::utils::config::ModelConfig;
use crate::validation::error::Result;

/// Contribution of each pass to the objective
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NllBreakdown<S> {
    pub toa: S,
    pub displacement: S,
    pub latency: S,
    pub burst: S,
}

impl<S: Scalar> NllBreakdown<S> {
    pub fn total(&self) -> S {
        self.toa + self.displacement + self.latency + self.burst
    }
}

/// Negative log-likelihood of a latent track given its detections.
///
/// Holds only borrowed data and settings; every evaluation is a pure
/// function of the latent state and log-parameters passed in, so one
/// instance can be shared across threads and called repeatedly by an
/// optimizer.
///
/// The latent state must match the data (`n_pings` rows, `n_hydrophones`
/// latency columns); [`DataValidator::check_state`](crate::validation::DataValidator::check_state)
/// verifies this once up front. Debug builds assert the shape on every
/// evaluation; release builds panic on the first out-of-range index, or
/// ignore trailing arrival rows when the state has fewer pings.
#[derive(Debug, Clone)]
pub struct TrackLikelihood<'a, R: ResidualDensity = Gaussian> {
    data: &'a TrackData,
    residual_model: R,
    parallel: bool,
}

impl<'a> TrackLikelihood<'a, Gaussian> {
    /// Likelihood with normal TOA residuals, evaluated serially
    pub fn new(data: &'a TrackData) -> Self {
        Self { data, residual_model: Gaussian, parallel: false }
    }
}

impl<'a> TrackLikelihood<'a, ResidualModel> {
    pub fn from_config(data: &'a TrackData, config: &ModelConfig) -> Self {
        Self { data, residual_model: config.residual_model, parallel: config.parallel_passes }
    }
}

impl<'a, R: ResidualDensity> TrackLikelihood<'a, R> {
    pub fn with_residual_model(data: &'a TrackData, residual_model: R) -> Self {
        Self { data, residual_model, parallel: false }
    }

    /// Evaluate the four passes concurrently on the rayon pool
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    pub fn data(&self) -> &TrackData {
        self.data
    }

    pub fn residual_model(&self) -> &R {
        &self.residual_model
    }

    pub fn layout(&self) -> ParameterLayout {
        ParameterLayout::for_data(self.data)
    }

    /// Total negative log-likelihood
    pub fn evaluate<S: Scalar>(&self, state: &LatentState<S>, params: &LogSigmas<S>) -> S {
        self.breakdown(state, params).total()
    }

    /// Negative log-likelihood split by pass
    pub fn breakdown<S: Scalar>(
        &self,
        state: &LatentState<S>,
        params: &LogSigmas<S>,
    ) -> NllBreakdown<S> {
        debug_assert!(
            state.n_pings() == self.data.n_pings()
                && state.ping_times.len() == self.data.n_pings()
                && state.latency.shape() == (self.data.n_pings(), self.data.n_hydrophones()),
            "latent state shape does not match data: {} pings, latency {:?}, data {}x{}",
            state.n_pings(),
            state.latency.shape(),
            self.data.n_pings(),
            self.data.n_hydrophones()
        );
        let sigmas = params.sigmas();
        if self.parallel {
            let ((toa, displacement), (latency, burst)) = rayon::join(
                || {
                    rayon::join(
                        || self.toa_pass(state, &sigmas),
                        || displacement_nll(state, sigmas.displacement_rates()),
                    )
                },
                || {
                    rayon::join(
                        || latency_nll(state, sigmas.dl),
                        || burst_nll(&state.ping_times, sigmas.bi),
                    )
                },
            );
            NllBreakdown { toa, displacement, latency, burst }
        } else {
            NllBreakdown {
                toa: self.toa_pass(state, &sigmas),
                displacement: displacement_nll(state, sigmas.displacement_rates()),
                latency: latency_nll(state, sigmas.dl),
                burst: burst_nll(&state.ping_times, sigmas.bi),
            }
        }
    }

    /// Evaluate at a flat parameter vector laid out by [`ParameterLayout`]
    pub fn evaluate_flat(&self, theta: &[f64]) -> Result<f64> {
        let (state, params) = self.layout().unpack(theta)?;
        Ok(self.evaluate(&state, &params))
    }

    fn toa_pass<S: Scalar>(&self, state: &LatentState<S>, sigmas: &Sigmas<S>) -> S {
        toa_nll(self.data, state, sigmas.toa, &self.residual_model)
    }
}
