use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ScheduleError {
    #[error("A growth schedule needs at least two stages, got {0}")]
    TooFewStages(usize),
}

/// Evenly spaced coupling values `λ_0 = 0 < λ_1 < … < λ_{M-1} = 1`.
///
/// Stage 0 is the fully decoupled solute, stage `M-1` the fully coupled one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthSchedule {
    lambdas: Vec<f64>,
}

impl GrowthSchedule {
    pub fn new(num_stages: usize) -> Result<Self, ScheduleError> {
        if num_stages < 2 {
            return Err(ScheduleError::TooFewStages(num_stages));
        }
        let last = (num_stages - 1) as f64;
        let mut lambdas: Vec<f64> = (0..num_stages).map(|j| j as f64 / last).collect();
        lambdas[num_stages - 1] = 1.0;
        Ok(Self { lambdas })
    }

    #[inline]
    pub fn lambda(&self, stage: usize) -> f64 {
        self.lambdas[stage]
    }

    #[inline]
    pub fn lambdas(&self) -> &[f64] {
        &self.lambdas
    }

    #[inline]
    pub fn num_stages(&self) -> usize {
        self.lambdas.len()
    }

    #[inline]
    pub fn max_stage(&self) -> usize {
        self.lambdas.len() - 1
    }

    /// Log-space correction for the unequal neighbour count of the end stages.
    ///
    /// `+ln 2` for `0→1` and `(M-2)→(M-1)`, `-ln 2` for the reverse moves,
    /// `0` for any other pair.
    pub fn boundary_correction(&self, from: usize, to: usize) -> f64 {
        let max = self.max_stage();
        if (from == 0 && to == 1) || (from + 1 == max && to == max) {
            LN_2
        } else if (from == 1 && to == 0) || (from == max && to + 1 == max) {
            -LN_2
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_spans_zero_to_one_strictly_increasing() {
        for m in 2..40 {
            let schedule = GrowthSchedule::new(m).unwrap();
            let l = schedule.lambdas();
            assert_eq!(l.len(), m);
            assert_eq!(l[0], 0.0);
            assert_eq!(l[m - 1], 1.0);
            assert!(l.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn fewer_than_two_stages_is_rejected() {
        assert_eq!(GrowthSchedule::new(1), Err(ScheduleError::TooFewStages(1)));
        assert_eq!(GrowthSchedule::new(0), Err(ScheduleError::TooFewStages(0)));
    }

    #[test]
    fn boundary_correction_applies_only_at_the_ends() {
        let s = GrowthSchedule::new(5).unwrap();
        assert_eq!(s.boundary_correction(0, 1), LN_2);
        assert_eq!(s.boundary_correction(3, 4), LN_2);
        assert_eq!(s.boundary_correction(1, 0), -LN_2);
        assert_eq!(s.boundary_correction(4, 3), -LN_2);
        assert_eq!(s.boundary_correction(1, 2), 0.0);
        assert_eq!(s.boundary_correction(2, 1), 0.0);
        assert_eq!(s.boundary_correction(2, 3), 0.0);
    }

    #[test]
    fn two_stage_schedule_corrects_each_direction_once() {
        let s = GrowthSchedule::new(2).unwrap();
        assert_eq!(s.boundary_correction(0, 1), LN_2);
        assert_eq!(s.boundary_correction(1, 0), -LN_2);
    }
}
