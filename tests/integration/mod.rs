//! Integration test suite for ttbuild
//!
//! These tests drive the `ttbuild` binary against temporary projects.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **end_to_end**: transform and preprocess output, failure isolation
//! - **incremental**: staleness across runs
//! - **cli**: command-line surface and exit codes

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cli;
mod end_to_end;
mod incremental;
