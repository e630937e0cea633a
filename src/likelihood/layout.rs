//! Flat parameter vector shared with an external optimizer.
//!
//! Order: positions (row-major `n_pings x 3`), ping times, latency residuals
//! (row-major `n_pings x n_hydrophones`), then the six log-parameters in
//! [`LOG_SIGMA_NAMES`] order.

use nalgebra::DMatrix;

use crate::autodiff::Scalar;
use crate::core::TrackData;
use crate::likelihood::params::{LogSigmas, LOG_SIGMA_NAMES, N_LOG_SIGMAS};
use crate::likelihood::state::LatentState;
use crate::validation::error::{ModelError, Result};

const AXES: [&str; 3] = ["x", "y", "z"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterLayout {
    pub n_pings: usize,
    pub n_hydrophones: usize,
}

impl ParameterLayout {
    pub fn new(n_pings: usize, n_hydrophones: usize) -> Self {
        Self { n_pings, n_hydrophones }
    }

    pub fn for_data(data: &TrackData) -> Self {
        Self::new(data.n_pings(), data.n_hydrophones())
    }

    /// Total number of entries in the flat vector
    pub fn len(&self) -> usize {
        self.log_sigma_offset() + N_LOG_SIGMAS
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of random-effect entries (everything except the log-parameters)
    pub fn n_random(&self) -> usize {
        self.log_sigma_offset()
    }

    #[inline]
    pub fn position_index(&self, ping: usize, axis: usize) -> usize {
        ping * 3 + axis
    }

    #[inline]
    pub fn ping_time_index(&self, ping: usize) -> usize {
        3 * self.n_pings + ping
    }

    #[inline]
    pub fn latency_index(&self, ping: usize, hydrophone: usize) -> usize {
        4 * self.n_pings + ping * self.n_hydrophones + hydrophone
    }

    #[inline]
    pub fn log_sigma_offset(&self) -> usize {
        4 * self.n_pings + self.n_pings * self.n_hydrophones
    }

    /// Human-readable name of entry `k`, e.g. `position[3].y` or `log_sigma_toa`
    pub fn name(&self, k: usize) -> Option<String> {
        if k >= self.len() {
            return None;
        }
        let name = if k < self.ping_time_index(0) {
            format!("position[{}].{}", k / 3, AXES[k % 3])
        } else if k < self.latency_index(0, 0) {
            format!("ping_time[{}]", k - self.ping_time_index(0))
        } else if k < self.log_sigma_offset() {
            let cell = k - self.latency_index(0, 0);
            format!("latency[{},{}]", cell / self.n_hydrophones, cell % self.n_hydrophones)
        } else {
            LOG_SIGMA_NAMES[k - self.log_sigma_offset()].to_string()
        };
        Some(name)
    }

    pub fn check_len(&self, len: usize) -> Result<()> {
        if len != self.len() {
            return Err(ModelError::DimensionMismatch {
                what: "parameter vector",
                expected: self.len(),
                actual: len,
            });
        }
        Ok(())
    }

    /// Flatten a latent state and its log-parameters
    pub fn pack(&self, state: &LatentState<f64>, params: &LogSigmas<f64>) -> Result<Vec<f64>> {
        if state.n_pings() != self.n_pings {
            return Err(ModelError::DimensionMismatch {
                what: "latent pings",
                expected: self.n_pings,
                actual: state.n_pings(),
            });
        }
        if state.n_hydrophones() != self.n_hydrophones {
            return Err(ModelError::DimensionMismatch {
                what: "latent hydrophones",
                expected: self.n_hydrophones,
                actual: state.n_hydrophones(),
            });
        }

        let mut theta = Vec::with_capacity(self.len());
        theta.extend(state.positions.iter().flatten());
        theta.extend(&state.ping_times);
        for i in 0..self.n_pings {
            theta.extend(state.latency.row(i).iter());
        }
        theta.extend(params.to_array());
        Ok(theta)
    }

    /// Rebuild a latent state and log-parameters from a flat vector of any scalar type
    pub fn unpack<S: Scalar>(&self, theta: &[S]) -> Result<(LatentState<S>, LogSigmas<S>)> {
        self.check_len(theta.len())?;

        let (positions, rest) = theta.split_at(3 * self.n_pings);
        let (ping_times, rest) = rest.split_at(self.n_pings);
        let (latency, log_sigmas) = rest.split_at(self.n_pings * self.n_hydrophones);

        let state = LatentState {
            positions: positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]).collect(),
            ping_times: ping_times.to_vec(),
            latency: DMatrix::from_row_slice(self.n_pings, self.n_hydrophones, latency),
        };
        let params = LogSigmas::new(
            log_sigmas[0],
            log_sigmas[1],
            log_sigmas[2],
            log_sigmas[3],
            log_sigmas[4],
            log_sigmas[5],
        );
        Ok((state, params))
    }
}
