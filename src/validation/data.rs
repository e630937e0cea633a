use log::warn;

use crate::autodiff::Scalar;
use crate::core::TrackData;
use crate::likelihood::state::LatentState;
use crate::validation::error::{ModelError, Result};

/// Configuration for data diagnostics
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Pings heard by fewer hydrophones than this are reported as weakly detected
    pub min_detections_per_ping: usize,
    /// Emit `warn!` records for findings
    pub log_findings: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_detections_per_ping: 3, // enough for a horizontal fix
            log_findings: true,
        }
    }
}

/// Diagnostics for a track and a candidate latent state.
///
/// Nothing here changes the objective; it only tells a caller which parts of
/// the data carry little information and where the latent state is fragile.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationReport {
    pub detections_per_ping: Vec<usize>,
    /// Pings no hydrophone heard
    pub undetected_pings: Vec<usize>,
    /// Pings heard, but by fewer than `min_detections_per_ping` hydrophones
    pub weakly_detected_pings: Vec<usize>,
    /// Hydrophones that never recorded a detection
    pub silent_hydrophones: Vec<usize>,
    /// Pings whose emission time is not after the previous one
    pub non_increasing_pings: Vec<usize>,
}

impl ValidationReport {
    /// No ordering problems and every ping heard at least once
    pub fn is_clean(&self) -> bool {
        self.undetected_pings.is_empty() && self.non_increasing_pings.is_empty()
    }
}

/// Validator for track data and latent states
pub struct DataValidator {
    config: ValidationConfig,
}

impl Default for DataValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

impl DataValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Verify a latent state has the shape the data requires
    pub fn check_state<S: Scalar>(&self, data: &TrackData, state: &LatentState<S>) -> Result<()> {
        if state.n_pings() != data.n_pings() {
            return Err(ModelError::DimensionMismatch {
                what: "latent positions",
                expected: data.n_pings(),
                actual: state.n_pings(),
            });
        }
        if state.ping_times.len() != data.n_pings() {
            return Err(ModelError::DimensionMismatch {
                what: "latent ping times",
                expected: data.n_pings(),
                actual: state.ping_times.len(),
            });
        }
        if state.latency.shape() != (data.n_pings(), data.n_hydrophones()) {
            return Err(ModelError::DimensionMismatch {
                what: "latency residual cells",
                expected: data.n_pings() * data.n_hydrophones(),
                actual: state.latency.len(),
            });
        }
        Ok(())
    }

    /// Check shapes, then collect diagnostics
    pub fn validate<S: Scalar>(
        &self,
        data: &TrackData,
        state: &LatentState<S>,
    ) -> Result<ValidationReport> {
        self.check_state(data, state)?;
        Ok(self.diagnose(data, state))
    }

    fn diagnose<S: Scalar>(&self, data: &TrackData, state: &LatentState<S>) -> ValidationReport {
        let detections_per_ping: Vec<usize> =
            (0..data.n_pings()).map(|i| data.arrivals.observed_in_ping(i)).collect();

        let undetected_pings: Vec<usize> = detections_per_ping
            .iter()
            .enumerate()
            .filter(|(_, &n)| n == 0)
            .map(|(i, _)| i)
            .collect();

        let weakly_detected_pings: Vec<usize> = detections_per_ping
            .iter()
            .enumerate()
            .filter(|(_, &n)| n > 0 && n < self.config.min_detections_per_ping)
            .map(|(i, _)| i)
            .collect();

        let silent_hydrophones: Vec<usize> = (0..data.n_hydrophones())
            .filter(|&h| (0..data.n_pings()).all(|i| data.arrivals.get(i, h).is_missing()))
            .collect();

        let non_increasing_pings: Vec<usize> = state
            .ping_times
            .windows(2)
            .enumerate()
            .filter(|(_, t)| t[1].value() <= t[0].value())
            .map(|(i, _)| i + 1)
            .collect();

        if self.config.log_findings {
            if !undetected_pings.is_empty() {
                warn!(
                    "{} pings have no detections: {:?}",
                    undetected_pings.len(),
                    undetected_pings
                );
            }
            if !silent_hydrophones.is_empty() {
                warn!("hydrophones without detections: {:?}", silent_hydrophones);
            }
            if !non_increasing_pings.is_empty() {
                warn!(
                    "ping times not strictly increasing at {:?}; \
                     displacement terms will be non-finite",
                    non_increasing_pings
                );
            }
        }

        ValidationReport {
            detections_per_ping,
            undetected_pings,
            weakly_detected_pings,
            silent_hydrophones,
            non_increasing_pings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ArrivalTable, HydrophoneArray};
    use nalgebra::DMatrix;

    const M: f64 = crate::core::MISSING_TOA_SENTINEL;

    fn create_test_data() -> TrackData {
        let hydrophones = HydrophoneArray::from_positions(&[
            [0.0, 0.0, 0.0],
            [100.0, 0.0, 0.0],
            [0.0, 100.0, 0.0],
            [100.0, 100.0, 0.0],
        ]);
        let rows = vec![
            vec![0.05, 0.06, 0.07, M],
            vec![M, M, M, M],
            vec![2.05, 2.04, M, M],
            vec![3.01, 3.02, 3.03, M],
        ];
        let arrivals = ArrivalTable::from_sentinel_rows(&rows, M).unwrap();
        TrackData::new(hydrophones, arrivals, 1500.0).unwrap()
    }

    #[test]
    fn test_check_state_shapes() {
        let data = create_test_data();
        let validator = DataValidator::default();

        assert!(validator.check_state(&data, &LatentState::<f64>::zeros(4, 4)).is_ok());
        assert!(validator.check_state(&data, &LatentState::<f64>::zeros(3, 4)).is_err());
        assert!(validator.check_state(&data, &LatentState::<f64>::zeros(4, 3)).is_err());
    }

    #[test]
    fn test_report_findings() {
        let data = create_test_data();
        let ping_times = vec![0.0, 1.0, 1.0, 3.0];
        let latency = DMatrix::from_element(4, 4, 0.0);
        let state = LatentState::new(vec![[0.0; 3]; 4], ping_times, latency).unwrap();
        let report = DataValidator::default().validate(&data, &state).unwrap();

        assert_eq!(report.detections_per_ping, vec![3, 0, 2, 3]);
        assert_eq!(report.undetected_pings, vec![1]);
        assert_eq!(report.weakly_detected_pings, vec![2]);
        assert_eq!(report.silent_hydrophones, vec![3]);
        assert_eq!(report.non_increasing_pings, vec![2]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_ordered_times_with_lenient_threshold() {
        let data = create_test_data();
        let mut state = LatentState::centroid_start(&data);
        state.ping_times = vec![0.0, 1.0, 2.0, 3.0];
        let config = ValidationConfig { min_detections_per_ping: 1, log_findings: false };
        let validator = DataValidator::new(config);
        let report = validator.validate(&data, &state).unwrap();

        assert!(report.weakly_detected_pings.is_empty());
        assert!(report.non_increasing_pings.is_empty());
        assert_eq!(report.undetected_pings, vec![1]);
        assert!(!report.is_clean());
    }
}
