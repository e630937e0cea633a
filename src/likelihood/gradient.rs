//! Gradients of the objective with respect to the flat parameter vector.
//!
//! [`gradient_forward`] propagates one [`Dual`] tangent per coordinate
//! (coordinates are spread over the rayon pool). [`gradient_central_difference`]
//! is the numerical reference used to check it.

use rayon::prelude::*;

use crate::autodiff::Dual;
use crate::density::ResidualDensity;
use crate::likelihood::objective::TrackLikelihood;
use crate::validation::error::Result;

/// Relative step used by [`gradient_central_difference`] when none is given
pub const DEFAULT_FD_STEP: f64 = 1e-6;

/// Comparison of analytic and numerical gradients
#[derive(Debug, Clone, PartialEq)]
pub struct GradientCheck {
    pub analytic: Vec<f64>,
    pub numerical: Vec<f64>,
    pub max_abs_error: f64,
    /// `|analytic - numerical| / max(1, |numerical|)`, worst coordinate
    pub max_rel_error: f64,
    /// Coordinate with the largest relative error
    pub worst_index: usize,
}

impl GradientCheck {
    pub fn passes(&self, tolerance: f64) -> bool {
        self.max_rel_error <= tolerance
    }
}

/// Objective value and its exact gradient at `theta`
pub fn value_and_gradient<R: ResidualDensity>(
    likelihood: &TrackLikelihood<'_, R>,
    theta: &[f64],
) -> Result<(f64, Vec<f64>)> {
    let value = likelihood.evaluate_flat(theta)?;
    let gradient = gradient_forward(likelihood, theta)?;
    Ok((value, gradient))
}

/// Exact gradient by forward-mode differentiation, one sweep per coordinate.
///
/// Each sweep seeds a fresh copy of the whole parameter vector and rebuilds
/// the latent state, so the cost is quadratic in the number of parameters.
/// Use it for checks and small tracks; an optimizer's inner loop should take
/// derivatives from its own AD runtime through [`Scalar`](crate::autodiff::Scalar).
pub fn gradient_forward<R: ResidualDensity>(
    likelihood: &TrackLikelihood<'_, R>,
    theta: &[f64],
) -> Result<Vec<f64>> {
    let layout = likelihood.layout();
    layout.check_len(theta.len())?;

    (0..theta.len())
        .into_par_iter()
        .map(|k| {
            let seeded: Vec<Dual> = theta
                .iter()
                .enumerate()
                .map(|(j, &v)| if j == k { Dual::var(v) } else { Dual::constant(v) })
                .collect();
            let (state, params) = layout.unpack(&seeded)?;
            Ok(likelihood.evaluate(&state, &params).dot)
        })
        .collect()
}

/// Central-difference gradient with step `step * max(1, |theta_k|)`
pub fn gradient_central_difference<R: ResidualDensity>(
    likelihood: &TrackLikelihood<'_, R>,
    theta: &[f64],
    step: f64,
) -> Result<Vec<f64>> {
    likelihood.layout().check_len(theta.len())?;

    let mut point = theta.to_vec();
    let mut gradient = Vec::with_capacity(theta.len());
    for k in 0..theta.len() {
        let h = step * theta[k].abs().max(1.0);
        point[k] = theta[k] + h;
        let upper = likelihood.evaluate_flat(&point)?;
        point[k] = theta[k] - h;
        let lower = likelihood.evaluate_flat(&point)?;
        point[k] = theta[k];
        gradient.push((upper - lower) / (2.0 * h));
    }
    Ok(gradient)
}

/// Compare [`gradient_forward`] against [`gradient_central_difference`]
pub fn check_gradient<R: ResidualDensity>(
    likelihood: &TrackLikelihood<'_, R>,
    theta: &[f64],
    step: f64,
) -> Result<GradientCheck> {
    let analytic = gradient_forward(likelihood, theta)?;
    let numerical = gradient_central_difference(likelihood, theta, step)?;

    let mut max_abs_error = 0.0_f64;
    let mut max_rel_error = 0.0_f64;
    let mut worst_index = 0;
    for (k, (a, n)) in analytic.iter().zip(&numerical).enumerate() {
        let abs_error = (a - n).abs();
        let rel_error = abs_error / n.abs().max(1.0);
        max_abs_error = max_abs_error.max(abs_error);
        if rel_error > max_rel_error {
            max_rel_error = rel_error;
            worst_index = k;
        }
    }

    if let Some(name) = likelihood.layout().name(worst_index) {
        log::debug!("gradient check: max relative error {:.3e} at {}", max_rel_error, name);
    }

    Ok(GradientCheck { analytic, numerical, max_abs_error, max_rel_error, worst_index })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ArrivalTable, Detection, HydrophoneArray, TrackData};
    use crate::density::GaussianStudentMixture;
    use crate::likelihood::params::LogSigmas;
    use crate::likelihood::state::LatentState;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;
    use proptest::prelude::*;

    fn square_array() -> HydrophoneArray {
        HydrophoneArray::from_positions(&[
            [0.0, 0.0, 0.0],
            [50.0, 0.0, -1.0],
            [0.0, 50.0, -2.0],
            [50.0, 50.0, 0.0],
        ])
    }

    /// Detections generated from a perturbed copy of the state, so residuals are non-zero
    fn data_for(
        state: &LatentState<f64>,
        hydrophones: HydrophoneArray,
        missing_every: usize,
    ) -> TrackData {
        let mut arrivals = ArrivalTable::empty(state.n_pings(), hydrophones.len());
        for i in 0..state.n_pings() {
            for (h, hydro) in hydrophones.iter().enumerate() {
                if missing_every > 0 && (i * hydrophones.len() + h) % missing_every == 0 {
                    continue;
                }
                let mut p = state.positions[i];
                p[0] += 0.5;
                let d = crate::likelihood::toa::distance(&p, &hydro.position);
                arrivals.set(i, h, Detection::Observed(state.ping_times[i] + d / 1500.0 + 2e-3));
            }
        }
        TrackData::new(hydrophones, arrivals, 1500.0).unwrap()
    }

    fn sample_state() -> LatentState<f64> {
        LatentState::new(
            vec![[10.0, 12.0, -3.0], [12.5, 13.0, -3.2], [14.0, 15.5, -2.9], [17.0, 16.0, -3.1]],
            vec![0.0, 1.05, 1.98, 3.02],
            DMatrix::from_fn(4, 4, |i, h| 1e-3 * ((i + 2 * h) % 3) as f64 - 1e-3),
        )
        .unwrap()
    }

    #[test]
    fn test_forward_matches_central_difference() {
        let state = sample_state();
        let data = data_for(&state, square_array(), 3);
        let likelihood = TrackLikelihood::new(&data);
        let params = LogSigmas::new(-3.0, -6.0, -5.0, 0.2, -0.1, -1.5);
        let theta = likelihood.layout().pack(&state, &params).unwrap();

        let check = check_gradient(&likelihood, &theta, DEFAULT_FD_STEP).unwrap();
        assert!(
            check.passes(1e-4),
            "max rel error {} at {}",
            check.max_rel_error,
            check.worst_index
        );
    }

    #[test]
    fn test_mixture_gradient_matches_central_difference() {
        let state = sample_state();
        let data = data_for(&state, square_array(), 0);
        let mixture = GaussianStudentMixture::new(-5.0, -2.0);
        let likelihood = TrackLikelihood::with_residual_model(&data, mixture);
        let params = LogSigmas::new(-3.0, -6.0, -5.5, 0.2, -0.1, -1.5);
        let theta = likelihood.layout().pack(&state, &params).unwrap();

        let check = check_gradient(&likelihood, &theta, DEFAULT_FD_STEP).unwrap();
        assert!(
            check.passes(1e-4),
            "max rel error {} at {}",
            check.max_rel_error,
            check.worst_index
        );
    }

    #[test]
    fn test_ping_on_hydrophone_keeps_finite_gradient() {
        let mut state = sample_state();
        state.positions[0] = [0.0, 0.0, 0.0];
        let data = data_for(&state, square_array(), 0);
        let likelihood = TrackLikelihood::new(&data);
        let layout = likelihood.layout();
        let theta = layout.pack(&state, &LogSigmas::zeros()).unwrap();

        let value = likelihood.evaluate_flat(&theta).unwrap();
        assert!(value.is_finite());

        let analytic = gradient_forward(&likelihood, &theta).unwrap();
        let numerical = gradient_central_difference(&likelihood, &theta, DEFAULT_FD_STEP).unwrap();
        // The distance to hydrophone 0 has a kink at ping 0's own position
        let kinked: Vec<usize> = (0..3).map(|axis| layout.position_index(0, axis)).collect();
        for k in (0..theta.len()).filter(|k| !kinked.contains(k)) {
            assert!(analytic[k].is_finite(), "non-finite derivative at {:?}", layout.name(k));
            assert_relative_eq!(analytic[k], numerical[k], epsilon = 1e-5, max_relative = 1e-5);
        }
        assert!(analytic[layout.log_sigma_offset()].is_finite());
    }

    #[test]
    fn test_value_and_gradient() {
        let state = sample_state();
        let data = data_for(&state, square_array(), 2);
        let likelihood = TrackLikelihood::new(&data);
        let params = LogSigmas::zeros();
        let theta = likelihood.layout().pack(&state, &params).unwrap();

        let (value, gradient) = value_and_gradient(&likelihood, &theta).unwrap();
        assert_relative_eq!(value, likelihood.evaluate(&state, &params), epsilon = 1e-12);
        assert_eq!(gradient.len(), theta.len());
    }

    #[test]
    fn test_latency_gradient_for_undetected_pair_is_prior_only() {
        // A missing pair's latency only appears in the latency pass: d/d dl = dl / sigma_dl^2
        let state = sample_state();
        let data = data_for(&state, square_array(), 3);
        assert!(data.arrivals.get(0, 0).is_missing());
        let likelihood = TrackLikelihood::new(&data);
        let params = LogSigmas::zeros();
        let theta = likelihood.layout().pack(&state, &params).unwrap();

        let gradient = gradient_forward(&likelihood, &theta).unwrap();
        let k = likelihood.layout().latency_index(0, 0);
        assert_relative_eq!(gradient[k], state.latency[(0, 0)], epsilon = 1e-12);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let state = sample_state();
        let data = data_for(&state, square_array(), 0);
        let likelihood = TrackLikelihood::new(&data);
        assert!(gradient_forward(&likelihood, &[0.0; 3]).is_err());
        assert!(gradient_central_difference(&likelihood, &[0.0; 3], DEFAULT_FD_STEP).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_forward_gradient_matches_finite_differences(
            offsets in proptest::collection::vec(-2.0f64..2.0, 12),
            intervals in proptest::collection::vec(0.8f64..1.2, 3),
            latency in proptest::collection::vec(-2e-3f64..2e-3, 16),
            log_sigmas in proptest::collection::vec(-1.0f64..1.0, 6),
        ) {
            let mut ping_times = vec![0.0];
            for dt in &intervals {
                let last = ping_times[ping_times.len() - 1];
                ping_times.push(last + dt);
            }
            let positions = (0..4)
                .map(|i| {
                    let o = &offsets[3 * i..3 * i + 3];
                    [10.0 + 2.0 * i as f64 + o[0], 20.0 + o[1], -3.0 + o[2]]
                })
                .collect();
            let latency = DMatrix::from_row_slice(4, 4, &latency);
            let state = LatentState::new(positions, ping_times, latency).unwrap();
            let data = data_for(&state, square_array(), 5);
            let likelihood = TrackLikelihood::new(&data);
            // Spreads sized to the track so every term stays well-conditioned
            let params = LogSigmas::new(
                -3.0 + log_sigmas[0],
                -6.0 + log_sigmas[1],
                -5.0 + log_sigmas[2],
                log_sigmas[3],
                log_sigmas[4],
                log_sigmas[5],
            );
            let theta = likelihood.layout().pack(&state, &params).unwrap();

            let check = check_gradient(&likelihood, &theta, DEFAULT_FD_STEP).unwrap();
            prop_assert!(
                check.passes(1e-3),
                "max rel error {} at {}",
                check.max_rel_error,
                check.worst_index
            );
        }
    }
}
