mod common;
use common::*;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use match_core::prelude::*;
use std::hint::black_box;

const INSTRUMENT: InstrumentId = 1;

fn bench_resting_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("resting insertion");
    group.throughput(Throughput::Elements(10_000));
    group.bench_function("insert 10k non-crossing orders", |b| {
        b.iter(|| {
            let mut engine = Engine::default();
            scalar(&mut engine, INSTRUMENT, "XYZ");
            for i in 0..10_000u64 {
                let result = engine.submit_order(gfd(i, INSTRUMENT, Side::Buy, (1000 - (i % 1000)) as Price, 10));
                black_box(result);
            }
        });
    });
    group.finish();
}

fn bench_sweeping_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweeping match");
    group.throughput(Throughput::Elements(10_000));
    group.bench_function("cross 10k resting sells with 10k incoming buys", |b| {
        b.iter_batched(
            || {
                let mut engine = Engine::default();
                scalar(&mut engine, INSTRUMENT, "XYZ");
                for i in 0..10_000u64 {
                    engine.submit_order(gfd(i, INSTRUMENT, Side::Sell, 1000 + (i % 500) as Price, 10));
                }
                engine
            },
            |mut engine| {
                for i in 10_000..20_000u64 {
                    let result = engine.submit_order(gfd(i, INSTRUMENT, Side::Buy, 1500, 10));
                    black_box(result);
                }
            },
            criterion::BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn bench_cancel(c: &mut Criterion) {
    let mut group = c.benchmark_group("cancellation");
    group.throughput(Throughput::Elements(5_000));
    group.bench_function("cancel 5k resting orders", |b| {
        b.iter_batched(
            || {
                let mut engine = Engine::default();
                scalar(&mut engine, INSTRUMENT, "XYZ");
                for i in 1..=5_000u64 {
                    engine.submit_order(gfd(i, INSTRUMENT, Side::Sell, 2000 + (i % 500) as Price, 10));
                }
                engine
            },
            |mut engine| {
                for i in 1..=5_000u64 {
                    black_box(engine.cancel_order(i, i));
                }
            },
            criterion::BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut engine = Engine::default();
    scalar(&mut engine, INSTRUMENT, "XYZ");
    for i in 0..2_000u64 {
        engine.submit_order(gfd(i, INSTRUMENT, Side::Buy, (1000 - (i % 1000)) as Price, 10));
        engine.submit_order(gfd(i, INSTRUMENT, Side::Sell, (2000 + (i % 1000)) as Price, 10));
    }

    let mut group = c.benchmark_group("snapshot");
    group.bench_function("get_snapshot depth 10 over 2k levels", |b| {
        b.iter(|| black_box(engine.get_snapshot(INSTRUMENT).unwrap()));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_resting_insertion,
    bench_sweeping_match,
    bench_cancel,
    bench_snapshot
);
criterion_main!(benches);
