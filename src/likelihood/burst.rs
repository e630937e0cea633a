//! Inter-ping interval pass.
//!
//! Transmitters ping on an almost fixed schedule, so the second difference
//! of consecutive emission times is penalized as zero-mean normal noise.

use crate::autodiff::Scalar;
use crate::density::normal;

/// Negative log-likelihood of the second differences of `ping_times`;
/// zero with fewer than three pings
pub fn burst_nll<S: Scalar>(ping_times: &[S], sigma_bi: S) -> S {
    let two = S::from_f64(2.0);
    ping_times
        .windows(3)
        .map(|t| normal::nll(t[2] - two * t[1] + t[0], S::zero(), sigma_bi))
        .sum()
}
