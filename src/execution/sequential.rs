use crate::constants_config::SimulationConstants;
use crate::errors::SimulationError;
use crate::execution::{ExecutionStrategy, StepReport, WorkerReport};
use crate::particles::{Particle, Quadtree};

/// Single-threaded baseline. Inserts without node guards, aggregates, walks the
/// leaves computing forces, then integrates.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sequential;

impl ExecutionStrategy for Sequential {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn threads(&self) -> usize {
        1
    }

    fn step(
        &self,
        tree: &mut Quadtree,
        particles: &mut [Particle],
        constants: &SimulationConstants,
    ) -> Result<StepReport, SimulationError> {
        tree.check_bounds(particles)?;
        let mut report = WorkerReport::new(0);

        for (index, particle) in particles.iter().enumerate() {
            tree.insert(particle.body(index))?;
            report.insertion.local += 1;
        }

        tree.aggregate();

        let tree: &Quadtree = tree;
        let mut traversal = Ok(());
        tree.visit_leaves(|leaf, body| {
            let particle = &mut particles[body.index];
            particle.leaf = Some(leaf.id());
            if traversal.is_ok() {
                traversal = tree.accumulate_force(particle, constants);
                report.forces.local += 1;
            }
        });
        traversal?;

        for particle in particles.iter_mut() {
            particle.integrate(constants.time_step);
            report.integrated += 1;
        }

        Ok(StepReport { workers: vec![report] })
    }
}
