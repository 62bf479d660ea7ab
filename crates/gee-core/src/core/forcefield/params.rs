use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LennardJonesParams {
    pub epsilon: f64,
    pub sigma: f64,
}

impl Default for LennardJonesParams {
    fn default() -> Self {
        Self {
            epsilon: 1.0,
            sigma: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarmonicBondParams {
    pub k: f64,
    pub r_eq: f64,
}

impl Default for HarmonicBondParams {
    fn default() -> Self {
        Self {
            k: 3.8e7,
            r_eq: 1.1225,
        }
    }
}

/// Complete set of interaction parameters for one polymer-in-solvent system.
///
/// `polymer` acts between monomers at least two bonds apart, `solvent` between
/// solvent particles, and `coupling` between a monomer and a solvent particle
/// (scaled by the growth parameter λ through the soft-core form).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ForcefieldParams {
    pub bond: HarmonicBondParams,
    pub polymer: LennardJonesParams,
    pub solvent: LennardJonesParams,
    pub coupling: LennardJonesParams,
    pub solvent_cutoff: Option<f64>,
}

impl ForcefieldParams {
    pub fn solvent_cutoff_sq(&self) -> Option<f64> {
        self.solvent_cutoff.map(|rc| rc * rc)
    }
}
