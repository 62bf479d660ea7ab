//! # Core Module
//!
//! Stateless building blocks of the free-energy engine.
//!
//! - **Models** ([`models`]) - Polymer conformations, the periodic solvent box and the λ growth schedule
//! - **Energy Calculations** ([`forcefield`]) - Bonded, Lennard-Jones and soft-core potentials and their sums
//! - **File I/O** ([`io`]) - The text conformation library and initial solvent box readers
//! - **Conformation Libraries** ([`library`]) - CV indexing, binning and conformation sources
//!
//! Nothing here holds simulation state; the [`crate::engine`] layer owns all of it.

pub mod forcefield;
pub mod io;
pub mod library;
pub mod models;
