//! Benchmarks for client-side statistics and materialized aggregation

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use statdb::core::{AggregationOperation, Record};
use statdb::query::aggregation::{statistics, AggregationSpec, HistogramBuilder};
use statdb::storage::MemoryExecutor;
use statdb::AggregationEngine;

fn random_values(n: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n).map(|_| rng.gen_range(0.0..10_000.0)).collect()
}

fn bench_order_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_statistics");
    for size in [1_000usize, 10_000, 100_000] {
        let values = random_values(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("median", size), &values, |b, values| {
            b.iter(|| statistics::median(black_box(values)))
        });
        group.bench_with_input(BenchmarkId::new("percentiles", size), &values, |b, values| {
            b.iter(|| statistics::percentiles(black_box(values), &[25.0, 50.0, 75.0, 99.0]))
        });
        group.bench_with_input(BenchmarkId::new("histogram", size), &values, |b, values| {
            let builder = HistogramBuilder::new(20).expect("valid bin count");
            b.iter(|| builder.build(black_box(values), 0.0, 10_000.0))
        });
    }
    group.finish();
}

fn bench_mixed_spec(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let executor = MemoryExecutor::new();
    executor.insert_many(
        "orders",
        (0..50_000).map(|i| {
            Record::new()
                .with("region", format!("r{}", i % 16))
                .with("amount", rng.gen_range(1.0..500.0))
        }),
    );
    let engine = AggregationEngine::new(Arc::new(executor), "orders");
    let spec = AggregationSpec::new()
        .count("n")
        .sum("total", "amount")
        .with("median", AggregationOperation::Median, "amount")
        .with("std_dev", AggregationOperation::StdDev, "amount");

    c.bench_function("aggregate_mixed_spec", |b| {
        b.iter(|| engine.aggregate(black_box(&spec)).expect("aggregate"))
    });
    c.bench_function("group_by_mixed_spec", |b| {
        b.iter(|| {
            engine
                .group_by_with_aggregations("region", black_box(&spec))
                .expect("grouped aggregate")
        })
    });
}

criterion_group!(benches, bench_order_statistics, bench_mixed_spec);
criterion_main!(benches);
