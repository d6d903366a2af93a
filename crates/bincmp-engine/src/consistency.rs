//! Three-way consistency between a reference and two candidates.
//!
//! Each candidate is diffed against the reference independently. Wherever both
//! candidates deviate from the reference at the same offset they must carry
//! the same byte; an offset where they disagree is a conflict.
//!
//! Length checks are asymmetric: the candidates are checked against each other
//! before any reading happens, and a candidate whose length differs from the
//! reference only shows up through its pairwise `SizeMismatch`. Either way the
//! check fails closed, as it does when any input is missing.

use std::collections::BTreeMap;
use std::path::Path;

use bincmp_core::config::CompareConfig;
use bincmp_core::{
    BincmpResult, ByteDifference, ComparisonOutcome, ConflictingBytes, ConsistencyResult,
    Incomparable,
};
use tracing::{debug, info};

use crate::compare::{regular_file_size, PairwiseComparator};

/// Runs two reference comparisons and intersects their difference sets.
#[derive(Debug, Clone, Copy)]
pub struct TripleConsistencyChecker {
    comparator: PairwiseComparator,
    parallel: bool,
}

impl Default for TripleConsistencyChecker {
    fn default() -> Self {
        Self::from_config(&CompareConfig::default())
    }
}

impl TripleConsistencyChecker {
    pub fn new(comparator: PairwiseComparator, parallel: bool) -> Self {
        Self {
            comparator,
            parallel,
        }
    }

    pub fn from_config(config: &CompareConfig) -> Self {
        Self::new(PairwiseComparator::from_config(config), config.parallel)
    }

    /// Check whether `candidate_a` and `candidate_b` agree at every offset
    /// where both differ from `reference`.
    pub fn check(
        &self,
        reference: &Path,
        candidate_a: &Path,
        candidate_b: &Path,
    ) -> BincmpResult<ConsistencyResult> {
        let Some(size_a) = regular_file_size(candidate_a)? else {
            return Ok(missing(candidate_a));
        };
        let Some(size_b) = regular_file_size(candidate_b)? else {
            return Ok(missing(candidate_b));
        };
        if size_a != size_b {
            info!(size_a, size_b, "candidates differ in length, not comparable");
            return Ok(ConsistencyResult::incomparable(
                Incomparable::CandidateSizeMismatch { size_a, size_b },
            ));
        }

        let (outcome_a, outcome_b) = if self.parallel {
            rayon::join(
                || self.comparator.compare(reference, candidate_a),
                || self.comparator.compare(reference, candidate_b),
            )
        } else {
            (
                self.comparator.compare(reference, candidate_a),
                self.comparator.compare(reference, candidate_b),
            )
        };

        let index_a = match candidate_index(outcome_a?, candidate_a) {
            Ok(index) => index,
            Err(reason) => return Ok(ConsistencyResult::incomparable(reason)),
        };
        let index_b = match candidate_index(outcome_b?, candidate_b) {
            Ok(index) => index,
            Err(reason) => return Ok(ConsistencyResult::incomparable(reason)),
        };

        let conflicts = find_conflicts(&index_a, &index_b);
        debug!(
            differences_a = index_a.len(),
            differences_b = index_b.len(),
            conflicts = conflicts.len(),
            "consistency check finished"
        );

        Ok(ConsistencyResult::from_conflicts(conflicts))
    }
}

/// Three-way check with the default configuration.
pub fn check_consistency(
    reference: &Path,
    candidate_a: &Path,
    candidate_b: &Path,
) -> BincmpResult<ConsistencyResult> {
    TripleConsistencyChecker::default().check(reference, candidate_a, candidate_b)
}

/// Map each differing offset to the second file's byte.
///
/// Later entries at the same offset win, though a single comparison never
/// repeats an offset.
pub fn difference_index(differences: &[ByteDifference]) -> BTreeMap<u64, u8> {
    differences.iter().map(|d| (d.offset, d.value_b)).collect()
}

/// Offsets present in both indexes whose bytes disagree.
pub fn find_conflicts(
    index_a: &BTreeMap<u64, u8>,
    index_b: &BTreeMap<u64, u8>,
) -> BTreeMap<u64, ConflictingBytes> {
    let (smaller, larger, swapped) = if index_a.len() <= index_b.len() {
        (index_a, index_b, false)
    } else {
        (index_b, index_a, true)
    };

    smaller
        .iter()
        .filter_map(|(&offset, &value)| {
            let other = *larger.get(&offset)?;
            if other == value {
                return None;
            }
            let (value_a, value_b) = if swapped { (other, value) } else { (value, other) };
            Some((offset, ConflictingBytes { value_a, value_b }))
        })
        .collect()
}

fn missing(path: &Path) -> ConsistencyResult {
    info!(path = %path.display(), "input missing, failing closed");
    ConsistencyResult::incomparable(Incomparable::Missing {
        path: path.to_path_buf(),
    })
}

fn candidate_index(
    outcome: ComparisonOutcome,
    candidate: &Path,
) -> Result<BTreeMap<u64, u8>, Incomparable> {
    match outcome {
        ComparisonOutcome::NotFound { path } => {
            info!(path = %path.display(), "input missing, failing closed");
            Err(Incomparable::Missing { path })
        }
        ComparisonOutcome::SizeMismatch { size_a, size_b } => {
            info!(
                candidate = %candidate.display(),
                reference_size = size_a,
                candidate_size = size_b,
                "candidate differs in length from reference"
            );
            Err(Incomparable::ReferenceSizeMismatch {
                candidate: candidate.to_path_buf(),
                reference_size: size_a,
                candidate_size: size_b,
            })
        }
        ComparisonOutcome::Identical { .. } => Ok(BTreeMap::new()),
        ComparisonOutcome::ContentDiffers { differences, .. } => {
            Ok(difference_index(&differences))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(pairs: &[(u64, u8)]) -> BTreeMap<u64, u8> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn disjoint_offsets_never_conflict() {
        let a = index(&[(0, 1), (2, 3)]);
        let b = index(&[(1, 9), (3, 9)]);
        assert!(find_conflicts(&a, &b).is_empty());
    }

    #[test]
    fn agreeing_overlap_is_not_a_conflict() {
        let a = index(&[(1, 0x42)]);
        let b = index(&[(1, 0x42), (2, 0x42), (3, 0x42)]);
        assert!(find_conflicts(&a, &b).is_empty());
    }

    #[test]
    fn disagreeing_overlap_keeps_both_values_in_order() {
        let a = index(&[(1, 0x42), (5, 0x10), (6, 0x11)]);
        let b = index(&[(1, 0x43)]);

        // `b` is smaller, so the search runs from its side
        let conflicts = find_conflicts(&a, &b);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(
            conflicts[&1],
            ConflictingBytes {
                value_a: 0x42,
                value_b: 0x43
            }
        );

        let reversed = find_conflicts(&b, &a);
        assert_eq!(
            reversed[&1],
            ConflictingBytes {
                value_a: 0x43,
                value_b: 0x42
            }
        );
    }

    #[test]
    fn index_uses_second_file_bytes() {
        let diffs = [ByteDifference::new(1, b'A', b'B'), ByteDifference::new(4, b'A', b'C')];
        assert_eq!(difference_index(&diffs), index(&[(1, b'B'), (4, b'C')]));
    }

    #[test]
    fn reference_size_mismatch_is_incomparable() {
        let outcome = ComparisonOutcome::SizeMismatch {
            size_a: 4,
            size_b: 8,
        };
        let reason = candidate_index(outcome, Path::new("cand")).unwrap_err();
        assert!(matches!(
            reason,
            Incomparable::ReferenceSizeMismatch {
                reference_size: 4,
                candidate_size: 8,
                ..
            }
        ));
    }
}
