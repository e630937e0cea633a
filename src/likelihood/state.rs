//! Latent state: one realization of the random effects per evaluation

use nalgebra::DMatrix;

use crate::autodiff::Scalar;
use crate::core::TrackData;
use crate::validation::error::{ModelError, Result};

/// Transmitter positions, emission times and per-detection latency residuals
#[derive(Debug, Clone, PartialEq)]
pub struct LatentState<S: Scalar> {
    /// Position `[x, y, z]` of the transmitter at each ping
    pub positions: Vec<[S; 3]>,
    /// Emission time of each ping
    pub ping_times: Vec<S>,
    /// Latency residual per (ping, hydrophone), `n_pings x n_hydrophones`
    pub latency: DMatrix<S>,
}

impl<S: Scalar> LatentState<S> {
    pub fn new(positions: Vec<[S; 3]>, ping_times: Vec<S>, latency: DMatrix<S>) -> Result<Self> {
        if ping_times.len() != positions.len() {
            return Err(ModelError::DimensionMismatch {
                what: "ping times",
                expected: positions.len(),
                actual: ping_times.len(),
            });
        }
        if latency.nrows() != positions.len() {
            return Err(ModelError::DimensionMismatch {
                what: "latency residual rows",
                expected: positions.len(),
                actual: latency.nrows(),
            });
        }
        Ok(Self { positions, ping_times, latency })
    }

    /// All-zero state for `n_pings` pings and `n_hydrophones` hydrophones
    pub fn zeros(n_pings: usize, n_hydrophones: usize) -> Self {
        Self {
            positions: vec![[S::zero(); 3]; n_pings],
            ping_times: vec![S::zero(); n_pings],
            latency: DMatrix::from_element(n_pings, n_hydrophones, S::zero()),
        }
    }

    pub fn n_pings(&self) -> usize {
        self.positions.len()
    }

    pub fn n_hydrophones(&self) -> usize {
        self.latency.ncols()
    }
}

impl LatentState<f64> {
    /// Promote to another scalar type as constants
    pub fn lift<S: Scalar>(&self) -> LatentState<S> {
        LatentState {
            positions: self.positions.iter().map(|p| p.map(S::from_f64)).collect(),
            ping_times: self.ping_times.iter().map(|&t| S::from_f64(t)).collect(),
            latency: self.latency.map(S::from_f64),
        }
    }

    /// Starting point for an optimizer.
    ///
    /// Every ping sits at the hydrophone centroid with zero latency. A ping's
    /// emission time is its earliest detection; pings nobody heard are placed
    /// by linear interpolation between heard neighbours, or extrapolated with
    /// the mean interval at either end. This keeps the initial ping times
    /// strictly ordered whenever the detections are.
    pub fn centroid_start(data: &TrackData) -> Self {
        let n_pings = data.n_pings();
        let n_hydrophones = data.n_hydrophones();

        let count = n_hydrophones as f64;
        let centroid = data
            .hydrophones
            .iter()
            .fold([0.0; 3], |acc, h| {
                [acc[0] + h.position.x, acc[1] + h.position.y, acc[2] + h.position.z]
            })
            .map(|sum| sum / count);

        let heard: Vec<(usize, f64)> = (0..n_pings)
            .filter_map(|i| {
                (0..n_hydrophones)
                    .filter_map(|h| data.arrivals.get(i, h).time())
                    .reduce(f64::min)
                    .map(|t| (i, t))
            })
            .collect();

        Self {
            positions: vec![centroid; n_pings],
            ping_times: fill_ping_times(n_pings, &heard),
            latency: DMatrix::from_element(n_pings, n_hydrophones, 0.0),
        }
    }
}

fn fill_ping_times(n_pings: usize, heard: &[(usize, f64)]) -> Vec<f64> {
    let (first, last) = match (heard.first(), heard.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return (0..n_pings).map(|i| i as f64).collect(),
    };
    let mean_interval = if last.0 > first.0 {
        (last.1 - first.1) / (last.0 - first.0) as f64
    } else {
        1.0
    };

    let mut times = Vec::with_capacity(n_pings);
    let mut next = 0;
    for i in 0..n_pings {
        while next < heard.len() && heard[next].0 < i {
            next += 1;
        }
        let t = match (next.checked_sub(1).map(|k| heard[k]), heard.get(next).copied()) {
            (_, Some((j, t))) if j == i => t,
            (Some((a, ta)), Some((b, tb))) => ta + (tb - ta) * (i - a) as f64 / (b - a) as f64,
            (None, _) => first.1 - mean_interval * (first.0 - i) as f64,
            (Some(_), None) => last.1 + mean_interval * (i - last.0) as f64,
        };
        times.push(t);
    }
    times
}
