//! Indexing and binning of a conformation library by collective variable, and
//! the sources walkers draw conformations from.

pub mod binning;
pub mod cv;
pub mod index;
pub mod source;
