//! # Core Models Module
//!
//! Plain data structures describing the simulated system: the solute chain, the
//! periodic solvent bath, and the discretized coupling schedule along which the
//! solute is grown into the solvent.
//!
//! ## Key Components
//!
//! - [`polymer`] - Rigid bead-spring conformations of the solute
//! - [`solvent`] - Solvent positions and the cubic periodic cell
//! - [`schedule`] - Growth stages and their λ values

pub mod polymer;
pub mod schedule;
pub mod solvent;
