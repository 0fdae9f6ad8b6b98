//! Common Test Utilities
//!
//! Shared fixtures used by unit tests across modules and by the property
//! suites.

pub mod fixtures;

pub use fixtures::*;
