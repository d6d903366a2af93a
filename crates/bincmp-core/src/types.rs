use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// A single byte position where two compared streams disagree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ByteDifference {
    /// Zero-based absolute position from the start of the stream
    pub offset: u64,
    /// Byte from the first file
    pub value_a: u8,
    /// Byte from the second file
    pub value_b: u8,
}

impl ByteDifference {
    pub fn new(offset: u64, value_a: u8, value_b: u8) -> Self {
        Self {
            offset,
            value_a,
            value_b,
        }
    }

    /// The same difference seen from the other side of the comparison.
    pub fn mirrored(&self) -> Self {
        Self {
            offset: self.offset,
            value_a: self.value_b,
            value_b: self.value_a,
        }
    }
}

/// Classified result of comparing two files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ComparisonOutcome {
    /// One of the inputs is not an existing regular file. No bytes were read.
    NotFound { path: PathBuf },
    /// The inputs have different lengths. No bytes were read.
    SizeMismatch { size_a: u64, size_b: u64 },
    /// Same length, same content.
    Identical { size: u64 },
    /// Same length, at least one differing byte.
    ContentDiffers {
        size: u64,
        /// Offset of the first differing byte
        first_offset: u64,
        /// Every differing byte, strictly increasing in offset
        differences: Vec<ByteDifference>,
    },
}

impl ComparisonOutcome {
    /// Build the outcome for two equal-length streams from their difference list.
    pub fn from_differences(size: u64, differences: Vec<ByteDifference>) -> Self {
        match differences.first() {
            None => Self::Identical { size },
            Some(first) => Self::ContentDiffers {
                size,
                first_offset: first.offset,
                differences,
            },
        }
    }

    pub fn is_identical(&self) -> bool {
        matches!(self, Self::Identical { .. })
    }

    /// Differing bytes; empty for every outcome except `ContentDiffers`.
    pub fn differences(&self) -> &[ByteDifference] {
        match self {
            Self::ContentDiffers { differences, .. } => differences,
            _ => &[],
        }
    }

    pub fn first_difference_offset(&self) -> Option<u64> {
        match self {
            Self::ContentDiffers { first_offset, .. } => Some(*first_offset),
            _ => None,
        }
    }

    /// Short label used in reports: "not found", "size", "identical", "content".
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not found",
            Self::SizeMismatch { .. } => "size",
            Self::Identical { .. } => "identical",
            Self::ContentDiffers { .. } => "content",
        }
    }
}

/// Candidate bytes at an offset where both candidates deviate from the
/// reference in different ways.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictingBytes {
    pub value_a: u8,
    pub value_b: u8,
}

/// Why a three-way check could not compare the candidates byte by byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Incomparable {
    /// The two candidates have different lengths.
    CandidateSizeMismatch { size_a: u64, size_b: u64 },
    /// A candidate's length differs from the reference's.
    ReferenceSizeMismatch {
        candidate: PathBuf,
        reference_size: u64,
        candidate_size: u64,
    },
    /// One of the three inputs does not exist as a regular file.
    Missing { path: PathBuf },
}

/// Verdict of a three-way consistency check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyResult {
    pub consistent: bool,
    /// Offsets where both candidates differ from the reference but not alike
    pub conflicts: BTreeMap<u64, ConflictingBytes>,
    /// Set when the candidates were never compared byte by byte
    pub incomparable: Option<Incomparable>,
}

impl ConsistencyResult {
    pub fn from_conflicts(conflicts: BTreeMap<u64, ConflictingBytes>) -> Self {
        Self {
            consistent: conflicts.is_empty(),
            conflicts,
            incomparable: None,
        }
    }

    /// Inconsistent without any conflict information.
    pub fn incomparable(reason: Incomparable) -> Self {
        Self {
            consistent: false,
            conflicts: BTreeMap::new(),
            incomparable: Some(reason),
        }
    }

    pub fn conflicting_offsets(&self) -> BTreeSet<u64> {
        self.conflicts.keys().copied().collect()
    }

    pub fn is_comparable(&self) -> bool {
        self.incomparable.is_none()
    }
}
