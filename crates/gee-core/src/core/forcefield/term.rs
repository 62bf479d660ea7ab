use serde::{Deserialize, Serialize};

/// The two λ-relevant contributions to the system energy.
///
/// The polymer's internal energy is deliberately absent: it does not depend on
/// λ and cancels in every stage-to-stage difference at fixed conformation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemEnergy {
    pub polymer_solvent: f64,
    pub solvent_solvent: f64,
}

impl SystemEnergy {
    pub fn new(polymer_solvent: f64, solvent_solvent: f64) -> Self {
        Self {
            polymer_solvent,
            solvent_solvent,
        }
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.polymer_solvent + self.solvent_solvent
    }
}
