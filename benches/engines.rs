use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mealy_conformance::{prelude::*, random::random_table};

fn uio_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("uio");
    for size in [8, 16, 32] {
        let table = random_table(size, 3, 3, 0.8, size as u64).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &table, |b, table| {
            b.iter(|| find_identifying_sequences(black_box(table)))
        });
    }
    group.finish();
}

fn discrimination_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("wmethod");
    for size in [8, 32, 128] {
        let table = random_table(size, 4, 4, 0.8, size as u64).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &table, |b, table| {
            b.iter(|| build_discrimination_tree(black_box(table)).sequences())
        });
    }
    group.finish();
}

criterion_group!(benches, uio_search, discrimination_tree);
criterion_main!(benches);
