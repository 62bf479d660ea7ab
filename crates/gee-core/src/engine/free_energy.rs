use super::collection::{CollectionMatrix, Transition};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Add;

/// Fluxes below this are treated as unobserved.
const MIN_FLUX: f64 = 1e-12;
/// Free-energy step, in kT, assigned when only one direction of a pair was observed.
const UNOBSERVED_FLUX_STEP_KT: f64 = 20.0;

/// A free-energy value that may be unreachable from the reference.
///
/// Serialized as a plain float, with `Unreachable` written as `+inf` so it
/// round-trips through TOML and CSV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FreeEnergy {
    Finite(f64),
    Unreachable,
}

impl FreeEnergy {
    pub const ZERO: FreeEnergy = FreeEnergy::Finite(0.0);

    /// `+∞` maps to `Unreachable`; every other value is kept as is.
    pub fn from_f64(value: f64) -> Self {
        if value == f64::INFINITY {
            Self::Unreachable
        } else {
            Self::Finite(value)
        }
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Self::Finite(v) => v,
            Self::Unreachable => f64::INFINITY,
        }
    }

    pub fn finite(self) -> Option<f64> {
        match self {
            Self::Finite(v) => Some(v),
            Self::Unreachable => None,
        }
    }

    pub fn is_unreachable(self) -> bool {
        matches!(self, Self::Unreachable)
    }
}

impl Add for FreeEnergy {
    type Output = FreeEnergy;

    fn add(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Self::Finite(a), Self::Finite(b)) => Self::from_f64(a + b),
            _ => Self::Unreachable,
        }
    }
}

impl fmt::Display for FreeEnergy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(v) => fmt::Display::fmt(v, f),
            Self::Unreachable => write!(f, "inf"),
        }
    }
}

impl Serialize for FreeEnergy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for FreeEnergy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Self::from_f64)
    }
}

/// Free energy per growth stage, anchored at stage 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FreeEnergyProfile(Vec<FreeEnergy>);

impl FreeEnergyProfile {
    pub fn new(values: Vec<FreeEnergy>) -> Self {
        Self(values)
    }

    pub fn from_f64s(values: &[f64]) -> Self {
        Self(values.iter().copied().map(FreeEnergy::from_f64).collect())
    }

    pub fn values(&self) -> &[FreeEnergy] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, stage: usize) -> Option<FreeEnergy> {
        self.0.get(stage).copied()
    }

    /// Value at the fully coupled stage.
    pub fn last(&self) -> Option<FreeEnergy> {
        self.0.last().copied()
    }

    pub fn to_f64s(&self) -> Vec<f64> {
        self.0.iter().map(|f| f.to_f64()).collect()
    }
}

/// Free-energy change from stage `j` to `j + 1` estimated from the
/// forward and backward fluxes of the collection matrix.
pub fn stage_increment(collection: &CollectionMatrix, stage: usize, beta: f64) -> f64 {
    let forward = collection.transition_probability(stage, Transition::ToHigher);
    let backward = collection.transition_probability(stage + 1, Transition::ToLower);
    if backward < MIN_FLUX {
        if forward < MIN_FLUX {
            0.0
        } else {
            -UNOBSERVED_FLUX_STEP_KT / beta
        }
    } else if forward < MIN_FLUX {
        UNOBSERVED_FLUX_STEP_KT / beta
    } else {
        -(forward / backward).ln() / beta
    }
}

/// Cumulative `F(j)` with `F(0) = 0`.
pub fn cumulative_free_energy(collection: &CollectionMatrix, beta: f64) -> Vec<f64> {
    let num_stages = collection.num_stages();
    let mut profile = Vec::with_capacity(num_stages);
    if num_stages == 0 {
        return profile;
    }
    profile.push(0.0);
    for stage in 0..num_stages - 1 {
        let next = profile[stage] + stage_increment(collection, stage, beta);
        profile.push(next);
    }
    profile
}

/// Stage-0-anchored free-energy profile of one completed walker.
pub fn intra_stage_profile(collection: &CollectionMatrix, beta: f64) -> FreeEnergyProfile {
    FreeEnergyProfile::from_f64s(&cumulative_free_energy(collection, beta))
}

/// Index of the first bin with a non-zero population.
pub fn reference_bin(counts: &[usize]) -> Option<usize> {
    counts.iter().position(|&n| n > 0)
}

/// `-(1/β) ln(n_i / n_ref)` for every bin; unreachable if either count is zero.
pub fn inter_bin_offsets(counts: &[usize], reference: usize, beta: f64) -> Vec<FreeEnergy> {
    let n_ref = counts.get(reference).copied().unwrap_or(0);
    counts
        .iter()
        .map(|&n| {
            if n == 0 || n_ref == 0 {
                FreeEnergy::Unreachable
            } else {
                FreeEnergy::Finite(-(n as f64 / n_ref as f64).ln() / beta)
            }
        })
        .collect()
}

/// Shifts an intra-bin profile by its bin's offset.
pub fn combine(intra: &FreeEnergyProfile, offset: FreeEnergy) -> FreeEnergyProfile {
    FreeEnergyProfile(intra.values().iter().map(|&f| f + offset).collect())
}

/// [`combine`] applied bin by bin.
pub fn combine_all(intra: &[FreeEnergyProfile], offsets: &[FreeEnergy]) -> Vec<FreeEnergyProfile> {
    intra
        .iter()
        .zip(offsets)
        .map(|(profile, &offset)| combine(profile, offset))
        .collect()
}
