use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use bh_engine::concurrency::{IndexDeque, LockedDeque, StampedDeque};
use bh_engine::execution::{build_strategy, ExecutionStrategy};
use bh_engine::particles::{uniform_particles, Quadtree};
use bh_engine::{DequeBackend, ExecutionMode, SimulationConstants};

const PARTICLES: usize = 2000;

pub fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_step");
    group.measurement_time(std::time::Duration::from_secs(5));
    group.sample_size(20);
    let constants = SimulationConstants::default();
    let initial = uniform_particles(PARTICLES, 99);

    let cases = [
        (ExecutionMode::Sequential, 1, DequeBackend::LockFree),
        (ExecutionMode::StaticPartition, 4, DequeBackend::LockFree),
        (ExecutionMode::WorkStealing, 4, DequeBackend::LockFree),
        (ExecutionMode::WorkStealing, 4, DequeBackend::Locked),
    ];

    for (mode, threads, deque) in cases {
        let strategy: Box<dyn ExecutionStrategy> = match build_strategy(mode, threads, deque) {
            Ok(strategy) => strategy,
            Err(e) => panic!("cannot build {} strategy: {}", mode, e),
        };
        let label = format!("{}-{:?}", strategy.name(), deque);
        group.bench_with_input(BenchmarkId::new(label, threads), &initial, |b, initial| {
            b.iter(|| {
                let mut particles = initial.clone();
                let mut tree = Quadtree::covering(&particles);
                let report = strategy.step(&mut tree, &mut particles, &constants);
                black_box(report.is_ok());
            })
        });
    }

    group.finish();
}

fn drain<D: IndexDeque>(len: usize) -> usize {
    let deque = D::from_range(0..len);
    let mut taken = 0;
    loop {
        let next = if taken % 2 == 0 { deque.pop_bottom() } else { deque.pop_top() };
        match next {
            Some(i) => {
                black_box(i);
                taken += 1;
            }
            None => return taken,
        }
    }
}

pub fn bench_deques(c: &mut Criterion) {
    let mut group = c.benchmark_group("deque_drain");
    group.bench_function("stamped", |b| b.iter(|| drain::<StampedDeque>(black_box(10_000))));
    group.bench_function("locked", |b| b.iter(|| drain::<LockedDeque>(black_box(10_000))));
    group.finish();
}

criterion_group!(benches, bench_step, bench_deques);
criterion_main!(benches);
