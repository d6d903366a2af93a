pub mod config;
pub mod error;
pub mod types;

pub use error::{BincmpError, BincmpResult};
pub use types::{
    ByteDifference, ComparisonOutcome, ConflictingBytes, ConsistencyResult, Incomparable,
};
