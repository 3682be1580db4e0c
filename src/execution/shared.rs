use std::sync::{Mutex, OnceLock, PoisonError};
use rayon::{ThreadPool, ThreadPoolBuilder};
use crate::concurrency::{lock, PhaseStats};
use crate::errors::SimulationError;
use crate::particles::{Body, Particle, Quadtree};

/// The particle array as seen by workers during one step. Each slot is only
/// ever touched by the worker that currently owns that index, so the locks
/// never contend.
pub(crate) struct SharedParticles {
    slots: Vec<Mutex<Particle>>,
}

impl SharedParticles {
    pub(crate) fn new(particles: &[Particle]) -> Self {
        Self {
            slots: particles.iter().copied().map(Mutex::new).collect(),
        }
    }

    pub(crate) fn body(&self, index: usize) -> Body {
        lock(&self.slots[index]).body(index)
    }

    pub(crate) fn update<R>(&self, index: usize, f: impl FnOnce(&mut Particle) -> R) -> R {
        let mut particle = lock(&self.slots[index]);
        f(&mut *particle)
    }

    pub(crate) fn link_leaves(&self, tree: &Quadtree) {
        tree.visit_leaves(|leaf, body| self.update(body.index, |p| p.leaf = Some(leaf.id())));
    }

    pub(crate) fn write_back(self, particles: &mut [Particle]) {
        for (particle, slot) in particles.iter_mut().zip(self.slots) {
            *particle = slot.into_inner().unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Keeps the first error any worker hits. Workers carry on to the next
/// barrier after recording, so no participant is left waiting.
#[derive(Default)]
pub(crate) struct FirstError(OnceLock<SimulationError>);

impl FirstError {
    pub(crate) fn record(&self, result: Result<(), SimulationError>) {
        if let Err(e) = result {
            let _ = self.0.set(e);
        }
    }

    pub(crate) fn is_set(&self) -> bool {
        self.0.get().is_some()
    }

    pub(crate) fn into_result(self) -> Result<(), SimulationError> {
        match self.0.into_inner() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

pub(crate) fn worker_pool(threads: usize) -> Result<ThreadPool, SimulationError> {
    if threads == 0 {
        return Err(SimulationError::InvalidThreadCount(threads));
    }
    Ok(ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("bh-worker-{}", i))
        .build()?)
}

/// What one worker did during one step.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker: usize,
    pub insertion: PhaseStats,
    pub forces: PhaseStats,
    pub integrated: usize,
}

impl WorkerReport {
    pub fn new(worker: usize) -> Self {
        Self { worker, ..Self::default() }
    }
}

/// Per-worker breakdown of one simulation step.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub workers: Vec<WorkerReport>,
}

impl StepReport {
    pub fn inserted(&self) -> usize {
        self.workers.iter().map(|w| w.insertion.processed()).sum()
    }

    pub fn forces_computed(&self) -> usize {
        self.workers.iter().map(|w| w.forces.processed()).sum()
    }

    pub fn integrated(&self) -> usize {
        self.workers.iter().map(|w| w.integrated).sum()
    }

    pub fn stolen(&self) -> usize {
        self.workers
            .iter()
            .map(|w| w.insertion.stolen + w.forces.stolen)
            .sum()
    }

    pub fn failed_steals(&self) -> usize {
        self.workers
            .iter()
            .map(|w| w.insertion.failed_steals + w.forces.failed_steals)
            .sum()
    }
}
