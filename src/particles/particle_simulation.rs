//! Step driver: owns the particle array and rebuilds the quadtree before every
//! step, handing the actual work to one [`ExecutionStrategy`].

use std::io::Write;
use log::{debug, info, warn};
use crate::constants_config::{RunConfig, SimulationConstants};
use crate::errors::SimulationError;
use crate::execution::{build_strategy, ExecutionStrategy, StepReport};
use crate::particles::{create_particles, Bounds, Particle, Quadtree};
use crate::trajectory::TrajectoryWriter;

pub struct Simulation {
    particles: Vec<Particle>,
    constants: SimulationConstants,
    strategy: Box<dyn ExecutionStrategy>,
    steps: usize,
}

impl Simulation {
    /// Creates a simulation over `particles`, stepped by `strategy`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bh_engine::execution::Sequential;
    /// use bh_engine::particles::{uniform_particles, Simulation};
    /// use bh_engine::SimulationConstants;
    ///
    /// let mut sim = Simulation::new(uniform_particles(64, 7), Box::new(Sequential), SimulationConstants::default());
    /// let report = sim.step().expect("step failed");
    /// assert_eq!(report.inserted(), 64);
    /// assert_eq!(sim.steps_taken(), 1);
    /// ```
    pub fn new(
        particles: Vec<Particle>,
        strategy: Box<dyn ExecutionStrategy>,
        constants: SimulationConstants,
    ) -> Self {
        if particles.is_empty() {
            warn!("simulation created without particles");
        }
        if strategy.threads() > particles.len() && !particles.is_empty() {
            warn!(
                "{} workers for {} particles; some workers get no chunk",
                strategy.threads(),
                particles.len()
            );
        }
        Self { particles, constants, strategy, steps: 0 }
    }

    pub fn from_config(config: &RunConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let particles = create_particles(config.layout, config.particles, config.seed);
        let strategy = build_strategy(config.mode, config.threads, config.deque)?;
        info!(
            "{} particles, {} strategy on {} thread(s)",
            particles.len(),
            strategy.name(),
            strategy.threads()
        );
        Ok(Self::new(particles, strategy, config.constants))
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn constants(&self) -> &SimulationConstants {
        &self.constants
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn steps_taken(&self) -> usize {
        self.steps
    }

    /// Runs one step on a fresh tree whose root is `bounds`.
    pub fn step_within(&mut self, bounds: Bounds) -> Result<StepReport, SimulationError> {
        let mut tree = Quadtree::new(bounds);
        let report = self.strategy.step(&mut tree, &mut self.particles, &self.constants)?;
        self.steps += 1;
        debug!(
            "step {}: {} tree nodes, depth {}",
            self.steps,
            tree.node_count(),
            tree.depth()
        );
        Ok(report)
    }

    /// Runs one step with the root sized to the current particles.
    pub fn step(&mut self) -> Result<StepReport, SimulationError> {
        self.step_within(Bounds::covering(&self.particles))
    }

    /// Runs `iterations` steps. Before each step the current positions go to
    /// `writer`, whose returned bounds size that step's root. `on_step` sees the
    /// 1-based iteration number before the step runs.
    pub fn run<W: Write, F: FnMut(usize)>(
        &mut self,
        iterations: usize,
        writer: &mut TrajectoryWriter<W>,
        mut on_step: F,
    ) -> Result<(), SimulationError> {
        for iteration in 1..=iterations {
            on_step(iteration);
            let bounds = writer.write_step(&self.particles)?;
            self.step_within(bounds)?;
        }
        Ok(())
    }
}
