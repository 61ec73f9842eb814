//! Benchmarks for local insertion and merge across the algorithms.
//!
//! These measure the flat-array kernels' linear scans and the Fugue tree's
//! size-guided lookups under the two editing patterns that matter:
//! sequential typing (the overwhelmingly common case) and random-position
//! inserts (the adversarial one).

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use converge::{Algorithm, Doc, FugueDoc, ListCrdt};

/// Deterministic position stream; keeps runs comparable without seeding a
/// full RNG.
struct Positions {
    state: u64,
}

impl Positions {
    fn new() -> Positions {
        return Positions { state: 0x9E3779B97F4A7C15 };
    }

    fn next(&mut self, bound: usize) -> usize {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        return (self.state >> 33) as usize % (bound + 1);
    }
}

fn sequential_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_typing_1k");
    for algorithm in Algorithm::ALL {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", algorithm)),
            &algorithm,
            |b, &algorithm| {
                b.iter(|| {
                    let mut doc: Doc<u32> = Doc::new(algorithm);
                    for k in 0..1000u32 {
                        doc.local_insert("bench", k as usize, k).unwrap();
                    }
                    black_box(doc.len())
                });
            },
        );
    }
    group.bench_function("Fugue", |b| {
        b.iter(|| {
            let mut doc: FugueDoc<u32> = FugueDoc::new();
            for k in 0..1000u32 {
                doc.local_insert("bench", k as usize, k).unwrap();
            }
            black_box(doc.len())
        });
    });
    group.finish();
}

fn random_inserts(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_inserts_1k");
    for algorithm in Algorithm::ALL {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", algorithm)),
            &algorithm,
            |b, &algorithm| {
                b.iter(|| {
                    let mut doc: Doc<u32> = Doc::new(algorithm);
                    let mut positions = Positions::new();
                    for k in 0..1000u32 {
                        let pos = positions.next(doc.len());
                        doc.local_insert("bench", pos, k).unwrap();
                    }
                    black_box(doc.len())
                });
            },
        );
    }
    group.bench_function("Fugue", |b| {
        b.iter(|| {
            let mut doc: FugueDoc<u32> = FugueDoc::new();
            let mut positions = Positions::new();
            for k in 0..1000u32 {
                let pos = positions.next(doc.len());
                doc.local_insert("bench", pos, k).unwrap();
            }
            black_box(doc.len())
        });
    });
    group.finish();
}

fn bidirectional_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_2x500");
    for algorithm in Algorithm::ALL {
        let mut a: Doc<u32> = Doc::new(algorithm);
        let mut b: Doc<u32> = Doc::new(algorithm);
        let mut positions = Positions::new();
        for k in 0..500u32 {
            a.local_insert("alice", positions.next(a.len()), k).unwrap();
            b.local_insert("bob", positions.next(b.len()), k).unwrap();
        }
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", algorithm)),
            &(a, b),
            |bench, (a, b)| {
                bench.iter(|| {
                    let mut left = a.clone();
                    let mut right = b.clone();
                    left.merge_from(b).unwrap();
                    right.merge_from(&left).unwrap();
                    black_box(left.len())
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, sequential_typing, random_inserts, bidirectional_merge);
criterion_main!(benches);
