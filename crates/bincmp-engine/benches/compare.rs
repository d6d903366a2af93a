use std::io::Cursor;

use bincmp_engine::{diff_streams, difference_index, find_conflicts};

fn make_data(size: usize) -> Vec<u8> {
    // Semi-realistic data: repeating pattern with some entropy
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

/// Flip one byte every `stride` bytes.
fn perturb(data: &[u8], stride: usize) -> Vec<u8> {
    let mut out = data.to_vec();
    for i in (0..out.len()).step_by(stride) {
        out[i] ^= 0x5a;
    }
    out
}

#[divan::bench(args = [1024, 65536, 1048576, 10485760])]
fn diff_identical(bencher: divan::Bencher, size: usize) {
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            diff_streams(Cursor::new(divan::black_box(&data)), Cursor::new(&data), 512).unwrap()
        });
}

#[divan::bench(args = [512, 4096, 65536])]
fn diff_chunk_size(bencher: divan::Bencher, chunk_size: usize) {
    let data = make_data(1048576);
    let other = perturb(&data, 64);
    bencher
        .counter(divan::counter::BytesCount::new(data.len()))
        .bench(|| {
            diff_streams(
                Cursor::new(divan::black_box(&data)),
                Cursor::new(&other),
                chunk_size,
            )
            .unwrap()
        });
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn conflict_intersection(bencher: divan::Bencher, size: usize) {
    let reference = make_data(size);
    let a = perturb(&reference, 3);
    let b = perturb(&reference, 5);
    let diffs_a = diff_streams(Cursor::new(&reference), Cursor::new(&a), 4096).unwrap();
    let diffs_b = diff_streams(Cursor::new(&reference), Cursor::new(&b), 4096).unwrap();
    let index_a = difference_index(&diffs_a);
    let index_b = difference_index(&diffs_b);
    bencher.bench(|| find_conflicts(divan::black_box(&index_a), divan::black_box(&index_b)));
}

fn main() {
    divan::main();
}
