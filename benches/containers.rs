use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ordered_containers::{ContainerConfig, ContainerKind, OrderedContainer};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

const KEYS: u64 = 2_000;

fn shuffled() -> Vec<u64> {
    let mut keys: Vec<u64> = (0..KEYS).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(7));
    keys
}

fn filled(kind: ContainerKind, keys: &[u64]) -> Box<dyn OrderedContainer<u64, u64>> {
    let mut c = kind.build(&ContainerConfig::default()).unwrap();
    for &k in keys {
        c.insert(k, k);
    }
    c
}

/// Insert 2000 shuffled keys into a fresh container.
fn bench_insert(c: &mut Criterion) {
    let keys = shuffled();
    let mut group = c.benchmark_group("insert");
    for kind in ContainerKind::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(kind), &keys, |b, keys| {
            b.iter(|| black_box(filled(kind, keys)))
        });
    }
    group.finish();
}

/// Look up every key once.
fn bench_search(c: &mut Criterion) {
    let keys = shuffled();
    let mut group = c.benchmark_group("search");
    for kind in ContainerKind::ALL {
        let container = filled(kind, &keys);
        group.bench_function(BenchmarkId::from_parameter(kind), |b| {
            b.iter(|| {
                for k in &keys {
                    black_box(container.search(k));
                }
            })
        });
    }
    group.finish();
}

/// Twenty ranges of one hundred keys each.
fn bench_range(c: &mut Criterion) {
    let keys = shuffled();
    let mut group = c.benchmark_group("range");
    for kind in ContainerKind::ALL {
        let container = filled(kind, &keys);
        group.bench_function(BenchmarkId::from_parameter(kind), |b| {
            b.iter(|| {
                for lo in (0..KEYS).step_by(100) {
                    black_box(container.range(&lo, &(lo + 99)));
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_search, bench_range);
criterion_main!(benches);
