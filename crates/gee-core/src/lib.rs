//! # GEE-TMMC Free-Energy Library
//!
//! Computes the free energy of growing a flexible bead-spring polymer into a
//! Lennard-Jones solvent, resolved along a conformational collective variable.
//! Each CV bin runs a generalized expanded-ensemble random walk over a
//! discretized coupling parameter λ, and transition-matrix Monte Carlo turns
//! the recorded stage-transition fluxes into free-energy differences.
//!
//! ## Architectural Philosophy
//!
//! - **[`core`]: The Foundation.** Stateless data models (`PolymerConformation`,
//!   `SolventConfiguration`, `GrowthSchedule`), pure potential functions and
//!   the conformation library with its CV index.
//!
//! - **[`engine`]: The Logic Core.** The per-bin `Walker`, its collection matrix,
//!   online bias adaptation and the free-energy estimator.
//!
//! - **[`workflows`]: The Public API.** The run orchestrator that bins the library,
//!   drives the walkers (in parallel with the `parallel` feature) and stitches
//!   their results into one global profile.

pub mod core;
pub mod engine;
pub mod workflows;
