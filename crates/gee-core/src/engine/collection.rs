use serde::{Deserialize, Serialize};

/// Flux denominators below this are treated as zero.
pub(crate) const MIN_ROW_TOTAL: f64 = 1e-12;

/// Column of the collection matrix: where an attempted stage move points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transition {
    ToLower,
    Stay,
    ToHigher,
}

impl Transition {
    pub const ALL: [Transition; 3] = [Self::ToLower, Self::Stay, Self::ToHigher];

    #[inline]
    fn column(self) -> usize {
        match self {
            Self::ToLower => 0,
            Self::Stay => 1,
            Self::ToHigher => 2,
        }
    }

    /// Direction of a move between adjacent stages, `None` if they are not adjacent.
    pub fn between(from: usize, to: usize) -> Option<Self> {
        if to + 1 == from {
            Some(Self::ToLower)
        } else if to == from {
            Some(Self::Stay)
        } else if to == from + 1 {
            Some(Self::ToHigher)
        } else {
            None
        }
    }
}

/// Accumulated transition-attempt weights, one `[to_lower, stay, to_higher]`
/// row per growth stage. Entries only ever grow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionMatrix {
    rows: Vec<[f64; 3]>,
}

impl CollectionMatrix {
    pub fn new(num_stages: usize) -> Self {
        Self {
            rows: vec![[0.0; 3]; num_stages],
        }
    }

    /// Builds a matrix from explicit rows, e.g. one read back from a report.
    pub fn from_rows(rows: Vec<[f64; 3]>) -> Self {
        Self { rows }
    }

    #[inline]
    pub fn num_stages(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn rows(&self) -> &[[f64; 3]] {
        &self.rows
    }

    #[inline]
    pub fn get(&self, stage: usize, transition: Transition) -> f64 {
        self.rows[stage][transition.column()]
    }

    pub fn add(&mut self, stage: usize, transition: Transition, weight: f64) {
        debug_assert!(weight >= 0.0, "collection weights are non-negative");
        self.rows[stage][transition.column()] += weight;
    }

    /// Books one attempt from `stage`.
    ///
    /// With a candidate move, `weight` goes to its column and `1 - weight` to
    /// `Stay`; without one, a full count goes to `Stay`.
    pub fn record_attempt(&mut self, stage: usize, direction: Option<Transition>, weight: f64) {
        match direction {
            Some(transition) if transition != Transition::Stay => {
                self.add(stage, transition, weight);
                self.add(stage, Transition::Stay, 1.0 - weight);
            }
            _ => self.add(stage, Transition::Stay, 1.0),
        }
    }

    #[inline]
    pub fn row_sum(&self, stage: usize) -> f64 {
        self.rows[stage].iter().sum()
    }

    /// `C[stage, transition] / ΣC[stage, :]`, regularized against empty rows.
    pub fn transition_probability(&self, stage: usize, transition: Transition) -> f64 {
        self.get(stage, transition) / (self.row_sum(stage) + MIN_ROW_TOTAL)
    }
}
