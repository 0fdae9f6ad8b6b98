//! Property-based tests for the NPC text pipeline
//!
//! Property tests verify invariants that should hold for all inputs, rather
//! than specific cases.
//!
//! ## Test Modules
//!
//! - `npc_extractor_props`: field extraction
//!   - Never yields a blank value
//!   - Same input, same map
//!   - Labelled single-line values come back trimmed
//!   - Rules are independent of each other
//!
//! - `placeholder_props`: fill plans
//!   - Always one replacement per template token, in template order
//!   - Filled count equals the number of present fields
//!   - No marker survives a fill
//!
//! By default, proptest runs 256 cases per property. This can be configured
//! via the `PROPTEST_CASES` environment variable:
//!
//! ```sh
//! PROPTEST_CASES=1000 cargo test property --release
//! ```

mod npc_extractor_props;
mod placeholder_props;
