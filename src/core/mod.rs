//! Core types and constants for the track likelihood

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
