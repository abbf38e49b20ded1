//! Test harnesses for the slsgen generator.
//!
//! Provides `FixtureProject` for running the binary against a scratch copy
//! of a checked-in fixture project.

#[cfg(test)]
pub mod cli;
pub mod project;

pub use project::{fixtures_dir, FixtureProject};
