use criterion::{black_box, criterion_group, criterion_main, Criterion};
use spawnloop::{partition, spawn_loop, WorkItem};
use std::sync::atomic::{AtomicU64, Ordering};

fn partition_benchmark(c: &mut Criterion) {
    c.bench_function("partition 1M over 12", |b| {
        b.iter(|| partition(black_box(1_000_000), black_box(12)))
    });
}

fn dispatch_benchmark(c: &mut Criterion) {
    let _ = spawnloop::threads_init();
    let workers = spawnloop::default_workers();

    c.bench_function("spawn_loop sum 1M", |b| {
        b.iter(|| {
            let total = AtomicU64::new(0);
            spawn_loop(
                black_box(1_000_000),
                workers,
                |item: WorkItem<'_, AtomicU64>| {
                    let sum: u64 = item.range().map(|i| i as u64).sum();
                    item.data.fetch_add(sum, Ordering::Relaxed);
                },
                &total,
            );
            total.into_inner()
        })
    });

    c.bench_function("spawn_loop inline", |b| {
        b.iter(|| {
            let total = AtomicU64::new(0);
            spawn_loop(
                black_box(1_000),
                1,
                |item: WorkItem<'_, AtomicU64>| {
                    item.data.fetch_add(item.len() as u64, Ordering::Relaxed);
                },
                &total,
            );
            total.into_inner()
        })
    });
}

criterion_group!(benches, partition_benchmark, dispatch_benchmark);
criterion_main!(benches);
