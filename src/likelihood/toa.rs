//! Geometry and time-of-arrival residual pass.
//!
//! For every (ping, hydrophone) pair with a recorded detection:
//! `expected = ping_time + distance / c + latency` and the residual
//! `observed - expected` is scored by the configured [`ResidualDensity`].
//! Missing pairs are skipped outright; no distance or residual is produced for them.

use nalgebra::Vector3;

use crate::autodiff::Scalar;
use crate::core::TrackData;
use crate::density::ResidualDensity;
use crate::likelihood::state::LatentState;

/// Euclidean distance between a transmitter position and a hydrophone
#[inline]
pub fn distance<S: Scalar>(position: &[S; 3], hydrophone: &Vector3<f64>) -> S {
    let dx = S::from_f64(hydrophone.x) - position[0];
    let dy = S::from_f64(hydrophone.y) - position[1];
    let dz = S::from_f64(hydrophone.z) - position[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Expected arrival time of a ping at one hydrophone
#[inline]
pub fn expected_arrival<S: Scalar>(ping_time: S, distance: S, sound_speed: S, latency: S) -> S {
    ping_time + distance / sound_speed + latency
}

/// Residual of every observed pair as `(ping, hydrophone, observed - expected)`
pub fn residuals<'a, S: Scalar>(
    data: &'a TrackData,
    state: &'a LatentState<S>,
) -> impl Iterator<Item = (usize, usize, S)> + 'a {
    let c = S::from_f64(data.sound_speed);
    state
        .positions
        .iter()
        .zip(&state.ping_times)
        .enumerate()
        .flat_map(move |(i, (position, &ping_time))| {
            data.hydrophones.iter().enumerate().filter_map(move |(h, hydrophone)| {
                let observed = data.arrivals.get(i, h).time()?;
                let dist = distance(position, &hydrophone.position);
                let expected = expected_arrival(ping_time, dist, c, state.latency[(i, h)]);
                Some((i, h, S::from_f64(observed) - expected))
            })
        })
}

/// Negative log-likelihood contribution of all observed arrival times
pub fn toa_nll<S: Scalar, R: ResidualDensity>(
    data: &TrackData,
    state: &LatentState<S>,
    sigma_toa: S,
    residual_model: &R,
) -> S {
    residuals(data, state)
        .map(|(_, _, eps)| residual_model.neg_log_density(eps, sigma_toa))
        .sum()
}
