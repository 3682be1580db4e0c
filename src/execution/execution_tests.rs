use approx::assert_abs_diff_eq;
use crate::concurrency::{LockedDeque, StampedDeque};
use crate::constants_config::{DequeBackend, ExecutionMode, SimulationConstants};
use crate::errors::SimulationError;
use crate::execution::{build_strategy, partition, ExecutionStrategy, Sequential, StaticPartition, WorkStealing};
use crate::particles::{uniform_particles, Bounds, Particle, Quadtree};

fn simulate(strategy: &dyn ExecutionStrategy, mut particles: Vec<Particle>, steps: usize) -> Vec<Particle> {
    let constants = SimulationConstants::default();
    for _ in 0..steps {
        let mut tree = Quadtree::covering(&particles);
        let report = strategy.step(&mut tree, &mut particles, &constants).unwrap();
        assert_eq!(report.inserted(), particles.len());
        assert_eq!(report.forces_computed(), particles.len());
        assert_eq!(report.integrated(), particles.len());
        assert_eq!(tree.root().count(), particles.len());
    }
    particles
}

fn assert_same_particles(a: &[Particle], b: &[Particle]) {
    assert_eq!(a.len(), b.len());
    for (p, q) in a.iter().zip(b) {
        assert_abs_diff_eq!(p.x, q.x, epsilon = 1e-6);
        assert_abs_diff_eq!(p.y, q.y, epsilon = 1e-6);
        assert_abs_diff_eq!(p.vx, q.vx, epsilon = 1e-6);
        assert_abs_diff_eq!(p.vy, q.vy, epsilon = 1e-6);
    }
}

#[test]
fn test_partition_chunks() {
    assert_eq!(partition(10, 3), vec![0..4, 4..8, 8..10]);
    assert_eq!(partition(9, 3), vec![0..3, 3..6, 6..9]);
    assert_eq!(partition(0, 2), vec![0..0, 0..0]);
    assert_eq!(partition(5, 1), vec![0..5]);
    assert!(partition(5, 0).is_empty());

    let ranges = partition(1001, 7);
    assert_eq!(ranges.iter().map(|r| r.len()).sum::<usize>(), 1001);
    assert!(ranges.windows(2).all(|w| w[0].end == w[1].start));
}

#[test]
fn test_more_workers_than_particles_get_empty_chunks() {
    let ranges = partition(2, 5);
    assert_eq!(ranges, vec![0..1, 1..2, 2..2, 2..2, 2..2]);

    let strategy = StaticPartition::new(5).unwrap();
    let result = simulate(&strategy, uniform_particles(2, 4), 2);
    assert_same_particles(&result, &simulate(&Sequential, uniform_particles(2, 4), 2));
}

#[test]
fn test_static_partition_matches_sequential() {
    let initial = uniform_particles(300, 42);
    let expected = simulate(&Sequential, initial.clone(), 5);
    for threads in [1, 2, 3, 8] {
        let strategy = StaticPartition::new(threads).unwrap();
        assert_same_particles(&simulate(&strategy, initial.clone(), 5), &expected);
    }
}

#[test]
fn test_work_stealing_matches_sequential() {
    let initial = uniform_particles(300, 42);
    let expected = simulate(&Sequential, initial.clone(), 5);
    for threads in [1, 2, 4, 7] {
        let stamped = WorkStealing::<StampedDeque>::new(threads).unwrap();
        assert_same_particles(&simulate(&stamped, initial.clone(), 5), &expected);

        let locked = WorkStealing::<LockedDeque>::new(threads).unwrap();
        assert_same_particles(&simulate(&locked, initial.clone(), 5), &expected);
    }
}

#[test]
fn test_every_index_handled_once_per_phase() {
    let strategy = WorkStealing::<StampedDeque>::new(4).unwrap();
    let mut particles = uniform_particles(1000, 9);
    let mut tree = Quadtree::covering(&particles);
    let report = strategy.step(&mut tree, &mut particles, &SimulationConstants::default()).unwrap();

    assert_eq!(report.workers.len(), 4);
    assert_eq!(report.inserted(), 1000);
    assert_eq!(report.forces_computed(), 1000);
    assert_eq!(report.workers.iter().map(|w| w.integrated).collect::<Vec<_>>(), vec![250; 4]);

    let mut seen = Vec::new();
    tree.visit_leaves(|_, body| seen.push(body.index));
    seen.sort_unstable();
    assert_eq!(seen, (0..1000).collect::<Vec<_>>());
    assert!(particles.iter().all(|p| p.leaf.is_some()));
}

#[test]
fn test_out_of_bounds_fails_without_deadlock() {
    let initial = uniform_particles(50, 3);
    let strategies: Vec<Box<dyn ExecutionStrategy>> = vec![
        Box::new(Sequential),
        Box::new(StaticPartition::new(3).unwrap()),
        Box::new(WorkStealing::<StampedDeque>::new(3).unwrap()),
    ];

    for strategy in &strategies {
        let mut particles = initial.clone();
        let mut tree = Quadtree::new(Bounds::square(0.0, 0.5));
        let err = strategy
            .step(&mut tree, &mut particles, &SimulationConstants::default())
            .unwrap_err();
        assert!(matches!(err, SimulationError::OutOfBounds { .. }), "{}: {:?}", strategy.name(), err);
        assert_eq!(particles, initial, "{} modified particles on failure", strategy.name());
    }
}

#[test]
fn test_coincident_particles_fail_in_parallel() {
    let mut particles = uniform_particles(20, 6);
    particles[7] = particles[3];
    let initial = particles.clone();

    for strategy in [
        build_strategy(ExecutionMode::StaticPartition, 4, DequeBackend::LockFree).unwrap(),
        build_strategy(ExecutionMode::WorkStealing, 4, DequeBackend::LockFree).unwrap(),
    ] {
        let mut tree = Quadtree::covering(&particles);
        let err = strategy
            .step(&mut tree, &mut particles, &SimulationConstants::default())
            .unwrap_err();
        assert!(matches!(err, SimulationError::TreeTooDeep { .. }), "{:?}", err);
        assert_eq!(particles, initial);
    }
}

#[test]
fn test_build_strategy_names_and_threads() {
    let sequential = build_strategy(ExecutionMode::Sequential, 0, DequeBackend::LockFree).unwrap();
    assert_eq!((sequential.name(), sequential.threads()), ("sequential", 1));

    let parallel = build_strategy(ExecutionMode::StaticPartition, 3, DequeBackend::LockFree).unwrap();
    assert_eq!((parallel.name(), parallel.threads()), ("static-partition", 3));

    let stealing = build_strategy(ExecutionMode::WorkStealing, 2, DequeBackend::Locked).unwrap();
    assert_eq!((stealing.name(), stealing.threads()), ("work-stealing", 2));
}

#[test]
fn test_zero_threads_rejected() {
    for mode in [ExecutionMode::StaticPartition, ExecutionMode::WorkStealing] {
        let err = build_strategy(mode, 0, DequeBackend::default()).err();
        assert_eq!(err, Some(SimulationError::InvalidThreadCount(0)));
    }
}
