use super::index::{LibraryEntry, LibraryIndex};
use serde::{Deserialize, Serialize};

const MIN_BIN_WIDTH: f64 = 1e-9;

/// Equal-width partition of the CV axis into `num_bins` bins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CvBinning {
    min: f64,
    max: f64,
    num_bins: usize,
}

impl CvBinning {
    /// `num_bins` is raised to 1 if zero.
    pub fn new(min: f64, max: f64, num_bins: usize) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
            num_bins: num_bins.max(1),
        }
    }

    /// Range from the configured bounds, widened to include the observed
    /// library range wherever a bound is absent or narrower.
    pub fn covering(
        configured_min: Option<f64>,
        configured_max: Option<f64>,
        observed: Option<(f64, f64)>,
        num_bins: usize,
    ) -> Self {
        let (obs_min, obs_max) = match observed {
            Some(range) => (Some(range.0), Some(range.1)),
            None => (None, None),
        };
        let min = match (configured_min, obs_min) {
            (Some(c), Some(o)) => c.min(o),
            (c, o) => c.or(o).unwrap_or(0.0),
        };
        let max = match (configured_max, obs_max) {
            (Some(c), Some(o)) => c.max(o),
            (c, o) => c.or(o).unwrap_or(min),
        };
        Self::new(min, max, num_bins)
    }

    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn width(&self) -> f64 {
        (self.max - self.min) / self.num_bins as f64
    }

    fn is_degenerate(&self) -> bool {
        self.width() < MIN_BIN_WIDTH
    }

    /// Bin holding `cv`, or `None` when it lies outside the range.
    ///
    /// With a degenerate width every in-range value lands in bin 0.
    pub fn bin_of(&self, cv: f64) -> Option<usize> {
        if !cv.is_finite() || cv < self.min - MIN_BIN_WIDTH || cv > self.max + MIN_BIN_WIDTH {
            return None;
        }
        if self.is_degenerate() {
            return Some(0);
        }
        let raw = ((cv - self.min) / self.width()).floor();
        Some((raw.max(0.0) as usize).min(self.num_bins - 1))
    }

    pub fn center(&self, bin: usize) -> f64 {
        if self.is_degenerate() {
            return self.min;
        }
        self.min + (bin as f64 + 0.5) * self.width()
    }

    pub fn centers(&self) -> Vec<f64> {
        (0..self.num_bins).map(|b| self.center(b)).collect()
    }

    /// Splits the index into per-bin subsets; entries outside the range are dropped.
    pub fn partition(&self, index: &LibraryIndex) -> Vec<Vec<LibraryEntry>> {
        let mut bins = vec![Vec::new(); self.num_bins];
        for entry in index.entries() {
            if let Some(b) = self.bin_of(entry.cv) {
                bins[b].push(entry.clone());
            }
        }
        bins
    }

    pub fn counts(&self, index: &LibraryIndex) -> Vec<usize> {
        let mut counts = vec![0; self.num_bins];
        for b in index.entries().iter().filter_map(|e| self.bin_of(e.cv)) {
            counts[b] += 1;
        }
        counts
    }
}
