//! Testing infrastructure for gridshell integration tests.
//!
//! This crate provides utilities for writing robust integration tests:
//! - `fixtures`: Sample catalogs, workspaces and pre-seeded stores
//! - `assertions`: Custom assertions for grid and persistence validation

pub mod assertions;
pub mod fixtures;

pub use fixtures::sample_catalog;
