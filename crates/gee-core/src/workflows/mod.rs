//! # Workflows Module
//!
//! Top-level entry points that tie the [`crate::core`] and [`crate::engine`]
//! layers together.
//!
//! - **GEE-TMMC run** ([`run`]) - Bins the library by CV, runs one walker per
//!   populated bin and assembles intra-bin and global free-energy profiles.

pub mod run;
