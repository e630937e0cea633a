//! Differentiation seam for the likelihood
//!
//! Every pass of the objective is written once, generically over [`Scalar`].
//! Evaluating with `f64` gives the plain objective value; evaluating with
//! [`Dual`] carries one directional derivative alongside it. An external
//! AD runtime plugs in by implementing [`Scalar`] for its own active type.

pub mod dual;
pub mod scalar;

pub use dual::Dual;
pub use scalar::Scalar;
