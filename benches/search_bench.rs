//! Criterion benchmarks for neighborhood scanning and hill climbing.
//!
//! Uses seeded random instances with due dates spread over the makespan.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use smwt_solver::cancel::CancellationToken;
use smwt_solver::heuristics::local_search::{HillClimbing, LocalSearch};
use smwt_solver::heuristics::neighborhood::{Neighborhood, NeighborhoodKind};
use smwt_solver::instance::{Instance, Job};
use smwt_solver::solution::{identity_schedule, make_rng, Solution};

fn random_instance(n: usize, seed: u64) -> Instance {
    let mut rng = make_rng(Some(seed)).unwrap();
    let jobs: Vec<Job> = (0..n)
        .map(|_| Job::new(rng.gen_range(1..=10), rng.gen_range(1..=5), 0))
        .collect();
    let makespan: i64 = jobs.iter().map(|j| j.processing_time).sum();
    let jobs = jobs
        .into_iter()
        .map(|job| Job {
            due_time: rng.gen_range(0..=makespan),
            ..job
        })
        .collect();
    Instance::new("bench", jobs)
}

fn bench_neighborhood_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("neighborhood_scan");

    for kind in [
        NeighborhoodKind::ConsecutiveSwap,
        NeighborhoodKind::Reverse,
        NeighborhoodKind::sliding(10),
        NeighborhoodKind::Reverse.backward(),
    ] {
        let instance = random_instance(100, 1);
        group.bench_with_input(
            BenchmarkId::from_parameter(kind.short_name()),
            &(instance, kind),
            |b, (instance, kind)| {
                let neighborhood = Neighborhood::new(kind.clone(), identity_schedule(100)).unwrap();
                b.iter(|| {
                    let mut cursor = neighborhood.cursor();
                    let mut best = i64::MAX;
                    while let Some(neighbor) = cursor.current() {
                        best = best.min(instance.evaluate_unchecked(neighbor));
                        cursor.advance();
                    }
                    black_box(best)
                });
            },
        );
    }

    group.finish();
}

fn bench_hill_climbing(c: &mut Criterion) {
    let mut group = c.benchmark_group("hill_climbing");
    group.sample_size(10);

    for n in [50, 100, 200] {
        let instance = random_instance(n, 7);
        group.bench_with_input(BenchmarkId::from_parameter(n), &instance, |b, instance| {
            let hc = HillClimbing::best_improvement(NeighborhoodKind::sliding(10));
            let cancel = CancellationToken::new();
            b.iter(|| {
                let mut solution =
                    Solution::from_schedule(instance, identity_schedule(n), "given").unwrap();
                hc.improve(instance, &mut solution, &cancel).unwrap();
                black_box(solution.cost)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_neighborhood_scan, bench_hill_climbing);
criterion_main!(benches);
