//! Shared test fixtures and utilities for the SLS crates.
//!
//! Provides canonical plants, seeded random sparse plants and assignments
//! that satisfy the nominal closed-loop recursion exactly.

pub mod fixtures;
pub mod nominal;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use fixtures::{chain_model, problem_for, ring_model, two_node_model};
pub use nominal::nominal_assignment;
pub use rng::{random_sparse_model, seeded_rng};
