//! bincmp-engine: byte-level file comparison
//!
//! # Overview
//! - `compare`: lock-step chunked streaming of two files, recording every differing byte
//! - `consistency`: three-way check that two candidates deviate from a shared
//!   reference in the same way wherever both deviate

pub mod compare;
pub mod consistency;

// Convenience re-exports for the most common operations
pub use compare::{compare_files, diff_streams, PairwiseComparator};
pub use consistency::{
    check_consistency, difference_index, find_conflicts, TripleConsistencyChecker,
};
