//! # Engine Module
//!
//! The stateful part of the library: per-bin expanded-ensemble walkers and the
//! statistics they produce.
//!
//! - **Configuration** ([`config`]) - The immutable run description and its validating builder
//! - **Walkers** ([`walker`]) - Solvent relaxation plus the biased growth-stage random walk
//! - **Transition statistics** ([`collection`]) - The per-stage collection matrix
//! - **Bias adaptation** ([`bias`]) - Online re-estimation of the η weights
//! - **Estimation** ([`free_energy`]) - Intra-bin profiles, inter-bin offsets and their combination
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Engine-specific error types

pub mod bias;
pub mod collection;
pub mod config;
pub mod error;
pub mod free_energy;
pub mod progress;
pub(crate) mod utils;
pub mod walker;
