use std::marker::PhantomData;
use log::{debug, info};
use rayon::ThreadPool;
use crate::concurrency::{IndexDeque, PhaseBarrier, StampedDeque, StealPhase};
use crate::constants_config::SimulationConstants;
use crate::errors::SimulationError;
use crate::execution::shared::{worker_pool, FirstError, SharedParticles};
use crate::execution::{partition, ExecutionStrategy, StepReport, WorkerReport};
use crate::particles::{Particle, Quadtree};

/// Same four barrier-separated phases as [`StaticPartition`](crate::execution::StaticPartition),
/// but insertion and force computation draw indices from one deque per worker.
/// A worker drains its own deque from the bottom, then steals from the top of
/// random peers until every worker has drained its own. Integration stays
/// statically partitioned since its cost is uniform.
///
/// `D` picks the deque backend; the lock-free stamped deque is the default.
pub struct WorkStealing<D = StampedDeque> {
    pool: ThreadPool,
    threads: usize,
    _deque: PhantomData<fn() -> D>,
}

impl<D: IndexDeque> WorkStealing<D> {
    pub fn new(threads: usize) -> Result<Self, SimulationError> {
        let pool = worker_pool(threads)?;
        info!(
            "work-stealing strategy with {} workers ({})",
            threads,
            std::any::type_name::<D>().rsplit("::").next().unwrap_or("deque")
        );
        Ok(Self { pool, threads, _deque: PhantomData })
    }
}

impl<D: IndexDeque> ExecutionStrategy for WorkStealing<D> {
    fn name(&self) -> &'static str {
        "work-stealing"
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
        if particles.len() > u32::MAX as usize {
            return Err(SimulationError::TooManyParticles(particles.len()));
        }

        let tree: &Quadtree = tree;
        let ranges = partition(particles.len(), self.threads);
        let shared = SharedParticles::new(particles);
        let failure = FirstError::default();
        let barriers: [PhaseBarrier; 3] = std::array::from_fn(|_| PhaseBarrier::new(self.threads));
        let insertion = StealPhase::<D>::new(&ranges);
        let forces = StealPhase::<D>::new(&ranges);

        let workers = self.pool.broadcast(|ctx| {
            let worker = ctx.index();
            let mut report = WorkerReport::new(worker);

            report.insertion = insertion.run(worker, |index| {
                failure.record(tree.insert_concurrent(shared.body(index)));
            });
            barriers[0].arrive();
            if failure.is_set() {
                return report;
            }

            if worker == 0 {
                tree.aggregate();
                shared.link_leaves(tree);
            }
            barriers[1].arrive();

            report.forces = forces.run(worker, |index| {
                failure.record(shared.update(index, |p| tree.accumulate_force(p, constants)));
            });
            barriers[2].arrive();

            for index in ranges[worker].clone() {
                shared.update(index, |p| p.integrate(constants.time_step));
                report.integrated += 1;
            }
            report
        });

        failure.into_result()?;
        shared.write_back(particles);

        let report = StepReport { workers };
        debug!(
            "work-stealing step: {} inserted, {} forces, {} stolen, {} failed steal attempts",
            report.inserted(),
            report.forces_computed(),
            report.stolen(),
            report.failed_steals()
        );
        Ok(report)
    }
}
