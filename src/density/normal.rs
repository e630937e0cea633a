//! Normal distribution log-density.
//!
//! No validation of `sigma`: a zero or negative standard deviation yields a
//! non-finite value, which the caller's optimizer is expected to reject.

use crate::autodiff::Scalar;
use crate::core::LN_SQRT_2PI;

/// Log-PDF of `N(mu, sigma)` at `x`.
///
/// `log p(x) = -0.5 * ((x-mu)/sigma)^2 - ln(sigma) - ln(sqrt(2π))`
#[inline]
pub fn logpdf<S: Scalar>(x: S, mu: S, sigma: S) -> S {
    let z = (x - mu) / sigma;
    -(S::from_f64(0.5) * z * z) - sigma.ln() - S::from_f64(LN_SQRT_2PI)
}

/// Negative log-PDF of `N(mu, sigma)` at `x`.
#[inline]
pub fn nll<S: Scalar>(x: S, mu: S, sigma: S) -> S {
    -logpdf(x, mu, sigma)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodiff::Dual;
    use approx::assert_relative_eq;

    #[test]
    fn test_standard_at_zero() {
        let lp = logpdf(0.0, 0.0, 1.0);
        assert_relative_eq!(lp, -LN_SQRT_2PI, epsilon = 1e-15);
    }

    #[test]
    fn test_matches_statrs() {
        use statrs::distribution::{Continuous, Normal};
        let reference = Normal::new(1.5, 2.5).unwrap();
        for x in [-3.0, 0.0, 1.5, 4.2] {
            assert_relative_eq!(logpdf(x, 1.5, 2.5), reference.ln_pdf(x), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_symmetry() {
        assert_relative_eq!(nll(1.3, 0.0, 2.0), nll(-1.3, 0.0, 2.0), epsilon = 1e-15);
    }

    #[test]
    fn test_zero_sigma_is_not_finite() {
        assert!(!nll(0.5, 0.0, 0.0).is_finite());
    }

    #[test]
    fn test_gradient_wrt_x() {
        // d/dx nll = (x - mu) / sigma^2
        let g = nll(Dual::var(1.0), Dual::constant(0.0), Dual::constant(2.0));
        assert_relative_eq!(g.dot, 0.25, epsilon = 1e-12);
    }
}
