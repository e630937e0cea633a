//! Student-t distribution log-density (standard location/scale).

use crate::autodiff::Scalar;
use statrs::function::gamma::ln_gamma;

/// Natural log of π.
const LN_PI: f64 = 1.144_729_885_849_400_2;

/// Log of the normalizing constant for `nu` degrees of freedom.
///
/// `nu` is a fixed model constant, so the gamma-function terms never carry a derivative.
pub fn log_norm_const(nu: f64) -> f64 {
    ln_gamma(0.5 * (nu + 1.0)) - ln_gamma(0.5 * nu) - 0.5 * (nu.ln() + LN_PI)
}

/// Log-PDF of a Student-t with location `mu`, scale `sigma` and `nu` degrees of freedom at `x`.
#[inline]
pub fn logpdf<S: Scalar>(x: S, mu: S, sigma: S, nu: f64) -> S {
    let z = (x - mu) / sigma;
    let kernel = (S::from_f64(1.0) + z * z / S::from_f64(nu)).ln();
    S::from_f64(log_norm_const(nu)) - sigma.ln() - S::from_f64(0.5 * (nu + 1.0)) * kernel
}
