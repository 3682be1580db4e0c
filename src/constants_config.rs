// src/constants_config.rs

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use crate::errors::SimulationError;
use crate::utils::{
    DEFAULT_ITERATIONS,
    DEFAULT_OUTPUT_DIR,
    DEFAULT_PARTICLE_COUNT,
    DEFAULT_SEED,
    DEFAULT_SIMULATION_CONSTANTS,
};

/// Numerical constants shared by every execution strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConstants {
    /// Barnes-Hut admissibility threshold.
    pub theta: f64,
    /// Explicit Euler time step.
    pub time_step: f64,
    /// Added to every squared distance before taking the inverse square root.
    pub softening: f64,
}

impl Default for SimulationConstants {
    fn default() -> Self {
        Self {
            theta: 0.5,
            time_step: 0.01,
            softening: 1e-9,
        }
    }
}

impl SimulationConstants {
    pub fn new(
        theta: Option<f64>,
        time_step: Option<f64>,
        softening: Option<f64>,
    ) -> Self {
        let default = DEFAULT_SIMULATION_CONSTANTS;
        Self {
            theta: theta.unwrap_or(default.theta),
            time_step: time_step.unwrap_or(default.time_step),
            softening: softening.unwrap_or(default.softening),
        }
    }

    /// Softened distance between two points, as used by both the force law and
    /// the admissibility test.
    pub fn softened_distance(&self, dx: f64, dy: f64) -> f64 {
        (dx * dx + dy * dy + self.softening).sqrt()
    }

    /// Returns true when a cell of side `side` seen from `distance` away may be
    /// replaced by its centroid. A ratio exactly equal to theta is not admissible.
    ///
    /// # Examples
    ///
    /// ```
    /// use bh_engine::SimulationConstants;
    ///
    /// let constants = SimulationConstants::default();
    /// assert!(constants.admits(1.0, 2.5));
    /// assert!(!constants.admits(1.0, 2.0));
    /// ```
    pub fn admits(&self, side: f64, distance: f64) -> bool {
        side / distance < self.theta
    }
}

/// Which strategy drives a simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Sequential,
    StaticPartition,
    WorkStealing,
}

impl ExecutionMode {
    pub fn code(&self) -> &'static str {
        match self {
            ExecutionMode::Sequential => "s",
            ExecutionMode::StaticPartition => "p",
            ExecutionMode::WorkStealing => "w",
        }
    }

    pub fn is_parallel(&self) -> bool {
        !matches!(self, ExecutionMode::Sequential)
    }
}

impl FromStr for ExecutionMode {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s" => Ok(ExecutionMode::Sequential),
            "p" => Ok(ExecutionMode::StaticPartition),
            "w" => Ok(ExecutionMode::WorkStealing),
            other => Err(SimulationError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Initial arrangement of particles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitialLayout {
    /// Positions and velocities sampled uniformly from a seeded generator.
    #[default]
    Uniform,
    /// Particles evenly spaced on the unit circle, at rest.
    Circle,
}

impl FromStr for InitialLayout {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uniform" => Ok(InitialLayout::Uniform),
            "circle" => Ok(InitialLayout::Circle),
            other => Err(SimulationError::InvalidOption { option: "layout", value: other.to_string() }),
        }
    }
}

/// Backend used for the per-thread index deques of the work-stealing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DequeBackend {
    /// Stamped-reference compare-and-swap deque.
    #[default]
    LockFree,
    /// Mutex-guarded deque.
    Locked,
}

impl FromStr for DequeBackend {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lock-free" | "lockfree" => Ok(DequeBackend::LockFree),
            "locked" | "mutex" => Ok(DequeBackend::Locked),
            other => Err(SimulationError::InvalidOption { option: "deque", value: other.to_string() }),
        }
    }
}

/// Everything the binary needs to set up a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub particles: usize,
    pub iterations: usize,
    pub mode: ExecutionMode,
    pub threads: usize,
    pub layout: InitialLayout,
    pub seed: u64,
    pub output_dir: PathBuf,
    pub deque: DequeBackend,
    pub constants: SimulationConstants,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            particles: DEFAULT_PARTICLE_COUNT,
            iterations: DEFAULT_ITERATIONS,
            mode: ExecutionMode::Sequential,
            threads: 1,
            layout: InitialLayout::default(),
            seed: DEFAULT_SEED,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            deque: DequeBackend::default(),
            constants: SimulationConstants::default(),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.mode.is_parallel() && self.threads == 0 {
            return Err(SimulationError::InvalidThreadCount(self.threads));
        }
        if self.particles > u32::MAX as usize {
            return Err(SimulationError::TooManyParticles(self.particles));
        }
        Ok(())
    }

    /// Path of the trajectory file for this run.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(format!("particles_{}.dat", self.mode.code()))
    }
}
