//! File formats consumed by the simulation: the text conformation library and
//! an optional pre-equilibrated solvent box.

pub mod conformations;
pub mod solvent;
