//! Core data types for the track likelihood

use log::debug;
use nalgebra::{DMatrix, Vector3};
use serde::{Deserialize, Serialize};

use crate::utils::config::ModelConfig;
use crate::validation::error::{ModelError, Result};

/// Stationary receiver with a known position in a local Cartesian frame (meters)
#[derive(Debug, Clone, PartialEq)]
pub struct Hydrophone {
    pub id: u16,
    pub position: Vector3<f64>,
}

impl Hydrophone {
    pub fn new(id: u16, x: f64, y: f64, z: f64) -> Self {
        Self { id, position: Vector3::new(x, y, z) }
    }
}

/// Ordered set of hydrophones; column `h` of an [`ArrivalTable`] refers to `hydrophones[h]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HydrophoneArray {
    hydrophones: Vec<Hydrophone>,
}

impl HydrophoneArray {
    pub fn new(hydrophones: Vec<Hydrophone>) -> Self {
        Self { hydrophones }
    }

    /// Build an array from bare coordinates, numbering hydrophones by position
    pub fn from_positions(positions: &[[f64; 3]]) -> Self {
        let hydrophones = positions
            .iter()
            .enumerate()
            .map(|(h, p)| Hydrophone::new(h as u16, p[0], p[1], p[2]))
            .collect();
        Self { hydrophones }
    }

    pub fn len(&self) -> usize {
        self.hydrophones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hydrophones.is_empty()
    }

    pub fn get(&self, h: usize) -> Option<&Hydrophone> {
        self.hydrophones.get(h)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hydrophone> {
        self.hydrophones.iter()
    }
}

/// One cell of the arrival table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Detection {
    /// Detection recorded at this time (seconds)
    Observed(f64),
    /// No detection for this (ping, hydrophone) pair
    Missing,
}

impl Detection {
    pub fn time(&self) -> Option<f64> {
        match self {
            Detection::Observed(t) => Some(*t),
            Detection::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Detection::Missing)
    }
}

/// Time-of-arrival table, one row per ping and one column per hydrophone
#[derive(Debug, Clone, PartialEq)]
pub struct ArrivalTable {
    cells: DMatrix<Detection>,
}

impl ArrivalTable {
    /// Table with every pair missing
    pub fn empty(n_pings: usize, n_hydrophones: usize) -> Self {
        Self { cells: DMatrix::from_element(n_pings, n_hydrophones, Detection::Missing) }
    }

    pub fn from_matrix(cells: DMatrix<Detection>) -> Self {
        Self { cells }
    }

    /// Convert raw rows (one per ping) where `sentinel` marks a missing detection.
    ///
    /// Only exact equality with the sentinel marks a cell missing. Non-finite
    /// times are rejected rather than silently treated as gaps.
    pub fn from_sentinel_rows(rows: &[Vec<f64>], sentinel: f64) -> Result<Self> {
        let n_pings = rows.len();
        if n_pings == 0 {
            return Err(ModelError::EmptyDimension { what: "arrival table pings" });
        }
        let n_hydrophones = rows[0].len();
        if n_hydrophones == 0 {
            return Err(ModelError::EmptyDimension { what: "arrival table hydrophones" });
        }

        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_hydrophones {
                return Err(ModelError::DimensionMismatch {
                    what: "arrival table row",
                    expected: n_hydrophones,
                    actual: row.len(),
                });
            }
            if let Some(h) = row.iter().position(|t| !t.is_finite()) {
                return Err(ModelError::InvalidParameter {
                    parameter: format!("toa[{}][{}]", i, h),
                    reason: format!("arrival time must be finite, got {}", row[h]),
                });
            }
        }

        let cells = DMatrix::from_fn(n_pings, n_hydrophones, |i, h| {
            let t = rows[i][h];
            if t == sentinel { Detection::Missing } else { Detection::Observed(t) }
        });
        Ok(Self { cells })
    }

    pub fn n_pings(&self) -> usize {
        self.cells.nrows()
    }

    pub fn n_hydrophones(&self) -> usize {
        self.cells.ncols()
    }

    #[inline]
    pub fn get(&self, ping: usize, hydrophone: usize) -> Detection {
        self.cells[(ping, hydrophone)]
    }

    pub fn set(&mut self, ping: usize, hydrophone: usize, detection: Detection) {
        self.cells[(ping, hydrophone)] = detection;
    }

    /// Number of detections recorded for one ping
    pub fn observed_in_ping(&self, ping: usize) -> usize {
        self.cells.row(ping).iter().filter(|d| !d.is_missing()).count()
    }

    pub fn observed_count(&self) -> usize {
        self.cells.iter().filter(|d| !d.is_missing()).count()
    }

    pub fn missing_count(&self) -> usize {
        self.cells.len() - self.observed_count()
    }
}

/// Observed inputs for one track: receiver geometry, detections and sound speed
#[derive(Debug, Clone, PartialEq)]
pub struct TrackData {
    pub hydrophones: HydrophoneArray,
    pub arrivals: ArrivalTable,
    /// Propagation speed of the signal (m/s)
    pub sound_speed: f64,
}

impl TrackData {
    pub fn new(
        hydrophones: HydrophoneArray,
        arrivals: ArrivalTable,
        sound_speed: f64,
    ) -> Result<Self> {
        if hydrophones.is_empty() {
            return Err(ModelError::EmptyDimension { what: "hydrophones" });
        }
        if arrivals.n_pings() == 0 {
            return Err(ModelError::EmptyDimension { what: "pings" });
        }
        if arrivals.n_hydrophones() != hydrophones.len() {
            return Err(ModelError::DimensionMismatch {
                what: "arrival table columns",
                expected: hydrophones.len(),
                actual: arrivals.n_hydrophones(),
            });
        }
        if !sound_speed.is_finite() || sound_speed <= 0.0 {
            return Err(ModelError::InvalidSoundSpeed(sound_speed));
        }

        debug!(
            "track data assembled: {} pings, {} hydrophones, {} detections, {} missing",
            arrivals.n_pings(),
            hydrophones.len(),
            arrivals.observed_count(),
            arrivals.missing_count()
        );

        Ok(Self { hydrophones, arrivals, sound_speed })
    }

    /// Assemble track data from raw arrays, using the configured sentinel and sound speed
    pub fn from_raw(
        hydrophone_positions: &[[f64; 3]],
        toa_rows: &[Vec<f64>],
        config: &ModelConfig,
    ) -> Result<Self> {
        let hydrophones = HydrophoneArray::from_positions(hydrophone_positions);
        let arrivals = ArrivalTable::from_sentinel_rows(toa_rows, config.missing_sentinel)?;
        Self::new(hydrophones, arrivals, config.sound_speed_ms)
    }

    pub fn n_pings(&self) -> usize {
        self.arrivals.n_pings()
    }

    pub fn n_hydrophones(&self) -> usize {
        self.hydrophones.len()
    }
}
