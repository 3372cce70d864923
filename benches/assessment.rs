//! Benchmarks for the estimator batteries.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use entropy_assessment::{Assessment, AssessmentOptions};

fn pseudo_random_bytes(n: usize) -> Vec<u8> {
    let mut x = 0x2545_f491u32;
    (0..n)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            (x >> 24) as u8
        })
        .collect()
}

fn non_iid_benchmark(c: &mut Criterion) {
    let engine = Assessment::new();
    let data = pseudo_random_bytes(100_000);

    c.bench_function("non_iid_100k_8bit", |b| {
        b.iter(|| engine.assess_non_iid(black_box(&data), 8).unwrap())
    });

    let binary: Vec<u8> = data.iter().map(|&v| v & 1).collect();
    c.bench_function("non_iid_100k_1bit", |b| {
        b.iter(|| engine.assess_non_iid(black_box(&binary), 1).unwrap())
    });
}

fn iid_benchmark(c: &mut Criterion) {
    // A reduced permutation count keeps the benchmark iterable; the
    // per-permutation cost is what this measures.
    let engine = Assessment::with_options(AssessmentOptions {
        permutation_count: 50,
        permutation_seed: Some([3u8; 32]),
        ..AssessmentOptions::default()
    });
    let data = pseudo_random_bytes(10_000);

    c.bench_function("iid_10k_50perm", |b| {
        b.iter(|| engine.assess_iid(black_box(&data), 8).unwrap())
    });
}

criterion_group!(benches, non_iid_benchmark, iid_benchmark);
criterion_main!(benches);
