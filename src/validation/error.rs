//! Error type for everything around the evaluator.
//!
//! The objective itself never fails: degenerate inputs surface as
//! non-finite values. Errors only arise while assembling inputs, mapping
//! flat vectors and loading configuration.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch { what: &'static str, expected: usize, actual: usize },

    #[error("{what} must not be empty")]
    EmptyDimension { what: &'static str },

    #[error("invalid sound speed {0} m/s: must be finite and positive")]
    InvalidSoundSpeed(f64),

    #[error("invalid value for {parameter}: {reason}")]
    InvalidParameter { parameter: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ModelError::DimensionMismatch { what: "ping times", expected: 4, actual: 3 };
        assert_eq!(err.to_string(), "dimension mismatch for ping times: expected 4, got 3");

        let err = ModelError::InvalidSoundSpeed(-1.0);
        assert!(err.to_string().contains("-1"));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ModelError = io.into();
        assert!(matches!(err, ModelError::Io(_)));
    }
}
