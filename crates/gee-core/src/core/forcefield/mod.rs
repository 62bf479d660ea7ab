//! # Force Field Module
//!
//! Pairwise and bonded potentials for a bead-spring solute in a Lennard-Jones
//! solvent, plus the λ-coupled soft-core interaction used to grow the solute
//! into the bath.
//!
//! ## Overview
//!
//! All functions here are pure. They take coordinates and parameters and
//! return energies in reduced units; none of them hold state.
//!
//! - **Harmonic bonds** between consecutive monomers
//! - **12-6 Lennard-Jones** between non-adjacent monomers and between solvent
//!   particles (the latter under the minimum-image convention)
//! - **Soft-core Lennard-Jones** between monomers and solvent, scaled by λ and
//!   finite at overlap
//!
//! Numerically coincident particles yield [`potentials::OVERLAP_PENALTY`]
//! rather than `inf` or `NaN`.
//!
//! ## Key Components
//!
//! - [`params`] - Interaction parameter sets
//! - [`energy`] - Energy sums over a conformation and a solvent configuration
//! - [`term`] - Breakdown of the λ-relevant system energy

pub mod energy;
pub mod params;
pub mod potentials;
pub mod term;
