//! Engine performance benchmarks (Criterion).
//!
//! Run: `cargo bench` or `cargo bench --bench engine`.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use matchbook::{FlowConfig, MatchingEngine, OrderFlow, OrderId};

fn bench_submit_throughput(c: &mut Criterion) {
    const N: usize = 1000;
    let mut group = c.benchmark_group("engine");
    group.throughput(Throughput::Elements(N as u64));
    group.bench_function("submit_1000", |b| {
        b.iter_batched(
            || {
                let requests = OrderFlow::new(FlowConfig {
                    seed: 42,
                    num_requests: N,
                    ..Default::default()
                })
                .all_requests();
                (MatchingEngine::new(), requests)
            },
            |(engine, requests)| {
                for request in requests {
                    let _ = engine.submit(request).unwrap();
                }
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_cancel(c: &mut Criterion) {
    const RESTING: usize = 500;
    const CANCELS_PER_ITER: usize = 100;
    let mut group = c.benchmark_group("engine");
    group.throughput(Throughput::Elements(CANCELS_PER_ITER as u64));
    group.bench_function("cancel_100_after_500_resting", |b| {
        b.iter_batched(
            || {
                // Buys only: nothing crosses, everything rests.
                let requests = OrderFlow::new(FlowConfig {
                    seed: 123,
                    num_requests: RESTING,
                    buy_ratio: 1.0,
                    limit_ratio: 1.0,
                    market_ratio: 0.0,
                    ..Default::default()
                })
                .all_requests();
                let engine = MatchingEngine::new();
                let mut cancel_ids: Vec<OrderId> = Vec::with_capacity(CANCELS_PER_ITER);
                for request in requests {
                    let result = engine.submit(request).unwrap();
                    if cancel_ids.len() < CANCELS_PER_ITER {
                        cancel_ids.push(result.order.id);
                    }
                }
                (engine, cancel_ids)
            },
            |(engine, cancel_ids)| {
                for id in cancel_ids {
                    let _ = engine.cancel(id);
                }
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    const RESTING: usize = 500;
    let mut group = c.benchmark_group("engine");
    group.bench_function("snapshot_after_500_resting", |b| {
        let requests = OrderFlow::new(FlowConfig {
            seed: 456,
            num_requests: RESTING,
            buy_ratio: 1.0,
            limit_ratio: 1.0,
            market_ratio: 0.0,
            price_min: 50,
            price_max: 150,
            ..Default::default()
        })
        .all_requests();
        let engine = MatchingEngine::new();
        for request in requests {
            engine.submit(request).unwrap();
        }
        b.iter(|| engine.snapshot("BTC/USD").unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_submit_throughput, bench_cancel, bench_snapshot);
criterion_main!(benches);
