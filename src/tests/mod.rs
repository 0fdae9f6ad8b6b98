//! Crate-internal test suites that span several modules.

pub mod common;
mod property;
