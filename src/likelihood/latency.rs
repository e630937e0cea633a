//! Hydrophone latency pass.
//!
//! Every latency residual is a zero-mean normal random effect, whether or
//! not the pair it belongs to was detected.

use crate::autodiff::Scalar;
use crate::density::normal;
use crate::likelihood::state::LatentState;

/// Negative log-likelihood of all `n_pings x n_hydrophones` latency residuals
pub fn latency_nll<S: Scalar>(state: &LatentState<S>, sigma_dl: S) -> S {
    state.latency.iter().map(|&dl| normal::nll(dl, S::zero(), sigma_dl)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LN_SQRT_2PI;
    use approx::assert_relative_eq;

    #[test]
    fn test_counts_every_cell() {
        let state = LatentState::<f64>::zeros(3, 4);
        assert_relative_eq!(latency_nll(&state, 1.0), 12.0 * LN_SQRT_2PI, epsilon = 1e-12);
    }

    #[test]
    fn test_wider_sigma_penalizes_large_residual_less() {
        let mut state = LatentState::<f64>::zeros(1, 1);
        state.latency[(0, 0)] = 3.0;
        assert!(latency_nll(&state, 2.0) < latency_nll(&state, 1.0));
    }
}
