//! Physical constants and model-wide numeric constants

/// Speed of sound in water under standard conditions (m/s)
pub const SPEED_OF_SOUND_WATER: f64 = 1500.0;

/// Raw value used by detection logs to mark a (ping, hydrophone) pair with no detection
pub const MISSING_TOA_SENTINEL: f64 = -9999.0;

/// `ln(sqrt(2π))`, the normalizing constant of the normal log-density
pub const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_7;

/// Degrees of freedom of the Student-t component in the heavy-tailed TOA residual model
pub const DEFAULT_STUDENT_T_DOF: f64 = 3.0;
