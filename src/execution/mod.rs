mod shared;
mod sequential;
mod static_partition;
mod work_stealing;

pub use shared::{StepReport, WorkerReport};
pub use sequential::*;
pub use static_partition::*;
pub use work_stealing::*;

use std::ops::Range;
use crate::concurrency::{LockedDeque, StampedDeque};
use crate::constants_config::{DequeBackend, ExecutionMode, SimulationConstants};
use crate::errors::SimulationError;
use crate::particles::{Particle, Quadtree};

/// One way of running a full simulation step (insert, aggregate, forces,
/// integrate) against a freshly built tree.
pub trait ExecutionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Number of workers the strategy runs a step on.
    fn threads(&self) -> usize;

    /// Runs one step. `tree` must be empty and its root must contain every
    /// particle. On error the particles are left as they were.
    fn step(
        &self,
        tree: &mut Quadtree,
        particles: &mut [Particle],
        constants: &SimulationConstants,
    ) -> Result<StepReport, SimulationError>;
}

/// Splits `0..n` into `workers` contiguous chunks of `ceil(n / workers)`
/// indices, the last ones truncated (possibly to empty).
///
/// # Examples
///
/// ```
/// use bh_engine::execution::partition;
///
/// assert_eq!(partition(10, 3), vec![0..4, 4..8, 8..10]);
/// assert_eq!(partition(2, 3), vec![0..1, 1..2, 2..2]);
/// ```
pub fn partition(n: usize, workers: usize) -> Vec<Range<usize>> {
    if workers == 0 {
        return Vec::new();
    }
    let chunk = n.div_ceil(workers);
    (0..workers)
        .map(|i| {
            let start = (i * chunk).min(n);
            let end = (start + chunk).min(n);
            start..end
        })
        .collect()
}

pub fn build_strategy(
    mode: ExecutionMode,
    threads: usize,
    deque: DequeBackend,
) -> Result<Box<dyn ExecutionStrategy>, SimulationError> {
    Ok(match mode {
        ExecutionMode::Sequential => Box::new(Sequential),
        ExecutionMode::StaticPartition => Box::new(StaticPartition::new(threads)?),
        ExecutionMode::WorkStealing => match deque {
            DequeBackend::LockFree => Box::new(WorkStealing::<StampedDeque>::new(threads)?),
            DequeBackend::Locked => Box::new(WorkStealing::<LockedDeque>::new(threads)?),
        },
    })
}

#[cfg(test)]
mod execution_tests;
