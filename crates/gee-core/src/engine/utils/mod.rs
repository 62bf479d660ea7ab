//! Random-draw helpers shared by the walker: conformation selection, trial
//! displacements and the Metropolis and GEE acceptance rules.

pub mod sampling;
