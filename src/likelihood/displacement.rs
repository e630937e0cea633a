//! Movement model pass.
//!
//! Each axis is a random walk with drift: the step between consecutive
//! pings is normal around the track's own mean step, with variance
//! `rate * dt` growing linearly in the time elapsed between the pings.
//!
//! `dt` is not checked. If the ping times are not strictly increasing the
//! standard deviation is `sqrt` of a non-positive number and the
//! contribution is non-finite; callers keep ping times ordered through
//! initialization or bounds.

use crate::autodiff::Scalar;
use crate::density::normal;
use crate::likelihood::state::LatentState;

/// Mean step per axis over the whole track; `None` with fewer than two pings
pub fn mean_displacement<S: Scalar>(positions: &[[S; 3]]) -> Option<[S; 3]> {
    if positions.len() < 2 {
        return None;
    }
    let mut sum = [S::zero(); 3];
    for pair in positions.windows(2) {
        for axis in 0..3 {
            sum[axis] = sum[axis] + (pair[1][axis] - pair[0][axis]);
        }
    }
    let steps = S::from_f64((positions.len() - 1) as f64);
    Some(sum.map(|s| s / steps))
}

/// Negative log-likelihood of all consecutive-ping displacements
pub fn displacement_nll<S: Scalar>(state: &LatentState<S>, variance_rates: [S; 3]) -> S {
    let Some(mean) = mean_displacement(&state.positions) else {
        return S::zero();
    };

    state
        .positions
        .windows(2)
        .zip(state.ping_times.windows(2))
        .map(|(pos, time)| {
            let dt = time[1] - time[0];
            (0..3)
                .map(|axis| {
                    let step = pos[1][axis] - pos[0][axis];
                    normal::nll(step, mean[axis], (variance_rates[axis] * dt).sqrt())
                })
                .sum::<S>()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LN_SQRT_2PI;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    fn state(positions: Vec<[f64; 3]>, ping_times: Vec<f64>) -> LatentState<f64> {
        let n = positions.len();
        LatentState::new(positions, ping_times, DMatrix::from_element(n, 1, 0.0)).unwrap()
    }

    #[test]
    fn test_single_ping_contributes_nothing() {
        let s = state(vec![[1.0, 2.0, 3.0]], vec![0.0]);
        assert!(mean_displacement(&s.positions).is_none());
        assert_eq!(displacement_nll(&s, [1.0; 3]), 0.0);
    }

    #[test]
    fn test_two_pings_give_three_terms_at_mean() {
        // With one step the step equals the mean, so only the normalizers remain.
        let s = state(vec![[0.0, 0.0, 0.0], [3.0, -1.0, 0.5]], vec![0.0, 4.0]);
        let rates = [1.0, 2.0, 0.5];
        let expected: f64 = rates.iter().map(|r: &f64| (r * 4.0).sqrt().ln() + LN_SQRT_2PI).sum();
        assert_relative_eq!(displacement_nll(&s, rates), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_mean_is_average_step() {
        let positions = vec![[0.0, 0.0, 0.0], [2.0, 0.0, 1.0], [2.0, 4.0, 1.0]];
        let mean = mean_displacement(&positions).unwrap();
        assert_eq!(mean, [1.0, 2.0, 0.5]);
    }

    #[test]
    fn test_residuals_against_mean() {
        let s = state(vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 0.0, 0.0]], vec![0.0, 1.0, 2.0]);
        // x steps 2 and 0 around mean 1, unit sd; y and z steps zero at mean zero
        let expected = 2.0 * 0.5 + 6.0 * LN_SQRT_2PI;
        assert_relative_eq!(displacement_nll(&s, [1.0; 3]), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_long_interval_tolerates_large_step() {
        // x steps of +10 and -10 around a zero mean
        let positions = vec![[0.0; 3], [10.0, 0.0, 0.0], [0.0, 0.0, 0.0]];
        let fast = state(positions.clone(), vec![0.0, 1.0, 2.0]);
        let slow = state(positions, vec![0.0, 100.0, 200.0]);
        assert!(displacement_nll(&slow, [1.0; 3]) < displacement_nll(&fast, [1.0; 3]));
    }

    #[test]
    fn test_non_increasing_time_is_not_finite() {
        let s = state(vec![[0.0; 3], [1.0, 0.0, 0.0], [3.0, 0.0, 0.0]], vec![0.0, 1.0, 0.5]);
        assert!(!displacement_nll(&s, [1.0; 3]).is_finite());
    }
}
