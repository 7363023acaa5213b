//! Simulation benchmarks for skirmish_core.
//!
//! Run with: `cargo bench -p skirmish_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use skirmish_core::registry::Allegiance;
use skirmish_core::simulation::Simulation;
use skirmish_test_utils::fixtures::{ground, rifleman, spawn};

fn skirmish_line(per_side: i32) -> Simulation {
    let mut sim = Simulation::default();
    for i in 0..per_side {
        spawn(&mut sim, Allegiance::Player, ground(i * 2, 0), rifleman());
        spawn(&mut sim, Allegiance::Enemy, ground(i * 2, 12), rifleman());
    }
    sim
}

/// Tick cost for growing engagements.
pub fn tick_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    for per_side in [8, 32, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(per_side * 2), &per_side, |b, &n| {
            b.iter_batched(
                || skirmish_line(n),
                |mut sim| {
                    for _ in 0..20 {
                        black_box(sim.tick());
                    }
                    sim
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// Mirror reconciliation cost.
pub fn synchronize_benchmark(c: &mut Criterion) {
    let mut sim = skirmish_line(64);
    for _ in 0..40 {
        sim.tick();
    }
    c.bench_function("synchronize_128", |b| {
        b.iter(|| black_box(sim.synchronize()));
    });
}

criterion_group!(benches, tick_benchmark, synchronize_benchmark);
criterion_main!(benches);
