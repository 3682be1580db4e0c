use log::{debug, info};
use rayon::ThreadPool;
use crate::concurrency::PhaseBarrier;
use crate::constants_config::SimulationConstants;
use crate::errors::SimulationError;
use crate::execution::shared::{worker_pool, FirstError, SharedParticles};
use crate::execution::{partition, ExecutionStrategy, StepReport, WorkerReport};
use crate::particles::{Particle, Quadtree};

/// Every worker owns one fixed contiguous chunk of the particle array for the
/// whole step. Phases are separated by barriers:
///
/// 1. insert own chunk (node guards on),
/// 2. worker 0 aggregates while the others wait,
/// 3. forces for own chunk,
/// 4. integrate own chunk.
///
/// Chunks are never rebalanced.
pub struct StaticPartition {
    pool: ThreadPool,
    threads: usize,
}

impl StaticPartition {
    pub fn new(threads: usize) -> Result<Self, SimulationError> {
        let pool = worker_pool(threads)?;
        info!("static partition strategy with {} workers", threads);
        Ok(Self { pool, threads })
    }
}

impl ExecutionStrategy for StaticPartition {
    fn name(&self) -> &'static str {
        "static-partition"
    }

    fn threads(&self) -> usize {
        self.threads
    }

    fn step(
        &self,
        tree: &mut Quadtree,
        particles: &mut [Particle],
        constants: &SimulationConstants,
    ) -> Result<StepReport, SimulationError> {
        tree.check_bounds(particles)?;

        let tree: &Quadtree = tree;
        let ranges = partition(particles.len(), self.threads);
        let shared = SharedParticles::new(particles);
        let failure = FirstError::default();
        let barriers: [PhaseBarrier; 3] = std::array::from_fn(|_| PhaseBarrier::new(self.threads));

        let workers = self.pool.broadcast(|ctx| {
            let worker = ctx.index();
            let range = ranges[worker].clone();
            let mut report = WorkerReport::new(worker);

            for index in range.clone() {
                failure.record(tree.insert_concurrent(shared.body(index)));
                report.insertion.local += 1;
            }
            barriers[0].arrive();
            if failure.is_set() {
                return report;
            }

            if worker == 0 {
                tree.aggregate();
                shared.link_leaves(tree);
            }
            barriers[1].arrive();

            for index in range.clone() {
                failure.record(shared.update(index, |p| tree.accumulate_force(p, constants)));
                report.forces.local += 1;
            }
            barriers[2].arrive();

            for index in range {
                shared.update(index, |p| p.integrate(constants.time_step));
                report.integrated += 1;
            }
            report
        });

        failure.into_result()?;
        shared.write_back(particles);

        let report = StepReport { workers };
        debug!(
            "static partition step: {} inserted, {} forces, {} integrated",
            report.inserted(),
            report.forces_computed(),
            report.integrated()
        );
        Ok(report)
    }
}
