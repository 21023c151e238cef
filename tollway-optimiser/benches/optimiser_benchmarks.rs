//! Criterion benchmarks for the toll optimiser.
//!
//! Measures combination enumeration across pool sizes and a full budget
//! search over an in-memory network, to catch regressions in ordering and
//! pruning cost.
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench --package tollway-optimiser
//! ```

// Criterion macros generate code that triggers missing_docs warnings.
#![allow(missing_docs, reason = "Criterion macros generate undocumented code")]

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tollway_core::test_support::{TollNetwork, candidate, priced_toll};
use tollway_core::{
    ClassPrices, Constraint, Cost, DiskAvoidanceBuilder, OptimiseRequest, Optimiser,
    TariffCostModel, TariffTable, TollKind, TollStation,
};
use tollway_optimiser::{CombinationGenerator, OptimiserConfig, ResultTracker, TollOptimiser};

/// Base-route pool sizes to enumerate over.
const POOL_SIZES: &[usize] = &[10, 20, 40];

/// Requests drawn from the generator per iteration.
const REQUESTS_PER_ITER: usize = 500;

/// Stations on the benchmark network.
const NETWORK_STATIONS: usize = 6;

/// A pool of `size` tolls with varied, mostly distinct prices.
fn build_pool(size: usize) -> Vec<TollStation> {
    (0..size)
        .map(|index| {
            let cents = u64::try_from(index).map_or(1, |step| 100 + step * 37);
            priced_toll(&format!("T{index}"), cents, 0.0)
        })
        .collect()
}

/// Benchmark drawing the first requests from pools of growing size.
fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("combination_generation");

    for &size in POOL_SIZES {
        let generator = CombinationGenerator::new(&build_pool(size));
        let draws = u64::try_from(REQUESTS_PER_ITER).unwrap_or(u64::MAX);
        group.throughput(Throughput::Elements(draws));
        group.bench_with_input(BenchmarkId::new("pool", size), &size, |b, &pool_size| {
            b.iter(|| {
                generator
                    .generate(1..=pool_size.min(4))
                    .take(REQUESTS_PER_ITER)
                    .count()
            });
        });
    }

    group.finish();
}

/// Benchmark slot updates for a stream of candidates.
fn bench_tracker(c: &mut Criterion) {
    let stream: Vec<_> = (0..64_u64)
        .map(|step| {
            let tolls = vec![priced_toll(&format!("T{step}"), step * 11, 0.0)];
            let avoided = format!("X{step}");
            Arc::new(candidate(3_000 + step * 31, tolls, &[avoided.as_str()]))
        })
        .collect();

    c.bench_function("tracker_updates", |b| {
        b.iter(|| {
            let tracker = ResultTracker::new(Constraint::MaxBudget(Cost::from_cents(350)));
            for offered in &stream {
                tracker.update(offered);
            }
            black_box(tracker.into_slots())
        });
    });
}

/// Benchmark a budget search over a network with one bypass per station.
fn bench_search(c: &mut Criterion) {
    let ids: Vec<String> = (0..NETWORK_STATIONS).map(|index| format!("S{index}")).collect();
    let all: Vec<&str> = ids.iter().map(String::as_str).collect();
    let mut network = ids
        .iter()
        .fold(TollNetwork::new(), |built, id| {
            built.with_station(id, TollKind::Open)
        })
        .with_corridor(&all, 3_600);
    let mut tariffs = TariffTable::new();
    for (step, id) in (1_u64..).zip(&ids) {
        let bypass: Vec<&str> = all
            .iter()
            .copied()
            .filter(|other| *other != id.as_str())
            .collect();
        network = network.with_corridor(&bypass, 3_600 + step * 120);
        tariffs = tariffs.with_open(
            id.as_str(),
            ClassPrices::uniform(Cost::from_cents(step * 100)),
        );
    }
    let waypoints = network.waypoints();

    c.bench_function("budget_search", |b| {
        b.iter(|| {
            let optimiser = TollOptimiser::with_config(
                &network,
                network.locator(),
                TariffCostModel::new(tariffs.clone()),
                DiskAvoidanceBuilder::default(),
                OptimiserConfig::default().with_workers(2),
            );
            let request = OptimiseRequest::new(
                waypoints.clone(),
                Constraint::MaxBudget(Cost::from_cents(1_600)),
            );
            #[expect(
                clippy::let_underscore_must_use,
                reason = "Benchmarking search performance, result is intentionally discarded"
            )]
            let _ = optimiser.map(|built| built.optimise(&request));
        });
    });
}

criterion_group!(benches, bench_generation, bench_tracker, bench_search);
criterion_main!(benches);
