//! Pairwise byte comparison
//!
//! Both files are read in lock-step, fixed-size chunks. Sizes are checked from
//! metadata first, so a missing file or a length mismatch is reported without
//! opening either file. The chunk size only sets I/O granularity; it never
//! changes the result.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use bincmp_core::config::{CompareConfig, DEFAULT_CHUNK_SIZE};
use bincmp_core::{BincmpError, BincmpResult, ByteDifference, ComparisonOutcome};
use tracing::{debug, trace, warn};

/// Streams two files and classifies how they differ.
#[derive(Debug, Clone, Copy)]
pub struct PairwiseComparator {
    chunk_size: usize,
}

impl Default for PairwiseComparator {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl PairwiseComparator {
    /// A zero chunk size is bumped to one byte.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn from_config(config: &CompareConfig) -> Self {
        Self::new(config.chunk_size)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Compare `path_a` against `path_b`.
    ///
    /// `NotFound` and `SizeMismatch` are returned as outcomes. Any other
    /// filesystem error, including a file changing length while it is read,
    /// is returned as [`BincmpError::IoFailure`] naming the offending path.
    pub fn compare(&self, path_a: &Path, path_b: &Path) -> BincmpResult<ComparisonOutcome> {
        let Some(size_a) = regular_file_size(path_a)? else {
            debug!(path = %path_a.display(), "comparison input not found");
            return Ok(ComparisonOutcome::NotFound {
                path: path_a.to_path_buf(),
            });
        };
        let Some(size_b) = regular_file_size(path_b)? else {
            debug!(path = %path_b.display(), "comparison input not found");
            return Ok(ComparisonOutcome::NotFound {
                path: path_b.to_path_buf(),
            });
        };

        if size_a != size_b {
            debug!(size_a, size_b, "size mismatch, skipping content comparison");
            return Ok(ComparisonOutcome::SizeMismatch { size_a, size_b });
        }

        let file_a = open(path_a)?;
        let file_b = open(path_b)?;

        let (differences, bytes_read) = lockstep(file_a, file_b, self.chunk_size)
            .map_err(|(side, e)| match side {
                Side::A => BincmpError::io_failure(path_a, e),
                Side::B => BincmpError::io_failure(path_b, e),
            })?;

        if bytes_read != size_a {
            warn!(
                expected = size_a,
                read = bytes_read,
                "files changed length during comparison"
            );
        }

        debug!(
            a = %path_a.display(),
            b = %path_b.display(),
            size = bytes_read,
            differences = differences.len(),
            chunk_size = self.chunk_size,
            "comparison finished"
        );

        Ok(ComparisonOutcome::from_differences(bytes_read, differences))
    }
}

/// Compare two files with the default chunk size.
pub fn compare_files(path_a: &Path, path_b: &Path) -> BincmpResult<ComparisonOutcome> {
    PairwiseComparator::default().compare(path_a, path_b)
}

/// Diff two equal-length streams.
///
/// Returns every differing byte in offset order. A stream that ends before
/// its counterpart yields an `UnexpectedEof` error.
pub fn diff_streams<A: Read, B: Read>(
    a: A,
    b: B,
    chunk_size: usize,
) -> io::Result<Vec<ByteDifference>> {
    lockstep(a, b, chunk_size.max(1))
        .map(|(differences, _)| differences)
        .map_err(|(_, e)| e)
}

/// Length of `path` if it is an existing regular file.
///
/// `Ok(None)` covers both "does not exist" and "exists but is not a regular
/// file"; every other metadata error is an I/O failure.
pub(crate) fn regular_file_size(path: &Path) -> BincmpResult<Option<u64>> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BincmpError::io_failure(path, e)),
    }
}

fn open(path: &Path) -> BincmpResult<File> {
    File::open(path).map_err(|e| BincmpError::io_failure(path, e))
}

#[derive(Debug, Clone, Copy)]
enum Side {
    A,
    B,
}

/// Walk both streams chunk by chunk. Returns the differences and the number
/// of bytes consumed from each stream.
fn lockstep<A: Read, B: Read>(
    mut a: A,
    mut b: B,
    chunk_size: usize,
) -> Result<(Vec<ByteDifference>, u64), (Side, io::Error)> {
    let mut buf_a = vec![0u8; chunk_size];
    let mut buf_b = vec![0u8; chunk_size];
    let mut differences = Vec::new();
    let mut offset: u64 = 0;

    loop {
        let n_a = fill(&mut a, &mut buf_a).map_err(|e| (Side::A, e))?;
        let n_b = fill(&mut b, &mut buf_b).map_err(|e| (Side::B, e))?;

        if n_a != n_b {
            let short = if n_a < n_b { Side::A } else { Side::B };
            return Err((
                short,
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "stream ended at offset {} before its counterpart",
                        offset + n_a.min(n_b) as u64
                    ),
                ),
            ));
        }
        if n_a == 0 {
            break;
        }

        let before = differences.len();
        differences.extend(
            buf_a[..n_a]
                .iter()
                .zip(&buf_b[..n_b])
                .enumerate()
                .filter(|(_, (x, y))| x != y)
                .map(|(i, (&x, &y))| ByteDifference::new(offset + i as u64, x, y)),
        );
        trace!(offset, len = n_a, new = differences.len() - before, "chunk compared");

        offset += n_a as u64;
    }

    Ok((differences, offset))
}

/// Read until `buf` is full or the stream is exhausted.
///
/// A plain `read` may return short; both sides must advance by the same
/// amount for offsets to stay aligned.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    /// Hands out at most one byte per read call.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.0[0];
            self.0 = &self.0[1..];
            Ok(1)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "nope"))
        }
    }

    #[test]
    fn equal_streams_have_no_differences() {
        let data = b"the same bytes on both sides";
        let diffs = diff_streams(Cursor::new(data), Cursor::new(data), 4).unwrap();
        assert!(diffs.is_empty());
    }

    #[test]
    fn empty_streams_are_equal() {
        let diffs = diff_streams(Cursor::new(b""), Cursor::new(b""), 512).unwrap();
        assert!(diffs.is_empty());
    }

    #[test]
    fn offsets_span_chunk_boundaries() {
        let a = vec![0u8; 10];
        let mut b = a.clone();
        b[3] = 1;
        b[4] = 2;
        b[9] = 3;

        let diffs = diff_streams(Cursor::new(&a), Cursor::new(&b), 4).unwrap();
        assert_eq!(
            diffs,
            vec![
                ByteDifference::new(3, 0, 1),
                ByteDifference::new(4, 0, 2),
                ByteDifference::new(9, 0, 3),
            ]
        );
    }

    #[test]
    fn short_reads_stay_aligned() {
        let a = b"AAAAAAAAAA";
        let b = b"AAAAABAAAA";
        let diffs = diff_streams(Trickle(a), Cursor::new(b), 3).unwrap();
        assert_eq!(diffs, vec![ByteDifference::new(5, b'A', b'B')]);
    }

    #[test]
    fn early_end_is_unexpected_eof() {
        let err = diff_streams(Cursor::new(b"abc"), Cursor::new(b"abcd"), 2).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn read_error_propagates() {
        let err = diff_streams(Cursor::new(b"abc"), Broken, 2).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn zero_chunk_size_is_clamped() {
        assert_eq!(PairwiseComparator::new(0).chunk_size(), 1);
        let diffs = diff_streams(Cursor::new(b"ab"), Cursor::new(b"ac"), 0).unwrap();
        assert_eq!(diffs, vec![ByteDifference::new(1, b'b', b'c')]);
    }

    fn same_length_pair() -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
        (0usize..2048).prop_flat_map(|n| {
            (
                proptest::collection::vec(any::<u8>(), n),
                proptest::collection::vec(any::<u8>(), n),
            )
        })
    }

    proptest! {
        #[test]
        fn differences_are_exactly_the_mismatched_bytes(
            (a, b) in same_length_pair(),
            chunk in 1usize..700,
        ) {
            let diffs = diff_streams(Cursor::new(&a), Cursor::new(&b), chunk).unwrap();
            let expected: Vec<ByteDifference> = a
                .iter()
                .zip(&b)
                .enumerate()
                .filter(|(_, (x, y))| x != y)
                .map(|(i, (&x, &y))| ByteDifference::new(i as u64, x, y))
                .collect();
            prop_assert_eq!(diffs, expected);
        }

        #[test]
        fn swapping_inputs_mirrors_values((a, b) in same_length_pair()) {
            let forward = diff_streams(Cursor::new(&a), Cursor::new(&b), 512).unwrap();
            let backward = diff_streams(Cursor::new(&b), Cursor::new(&a), 512).unwrap();
            let mirrored: Vec<ByteDifference> =
                forward.iter().map(ByteDifference::mirrored).collect();
            prop_assert_eq!(backward, mirrored);
        }

        #[test]
        fn chunk_size_does_not_change_result(
            (a, b) in same_length_pair(),
            c1 in 1usize..64,
            c2 in 64usize..4096,
        ) {
            let small = diff_streams(Cursor::new(&a), Cursor::new(&b), c1).unwrap();
            let large = diff_streams(Cursor::new(&a), Cursor::new(&b), c2).unwrap();
            prop_assert_eq!(small, large);
        }
    }
}
