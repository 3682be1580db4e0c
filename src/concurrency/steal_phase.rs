use std::hint;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use rand::Rng;
use crate::concurrency::IndexDeque;

/// Failed steal attempts spent spinning before a worker starts yielding.
const SPIN_ATTEMPTS: u32 = 6;

/// Work done by one worker during one stealing phase.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PhaseStats {
    /// Indices taken from the worker's own queue.
    pub local: usize,
    /// Indices taken from peer queues.
    pub stolen: usize,
    /// Steal attempts that came back empty.
    pub failed_steals: usize,
}

impl PhaseStats {
    pub fn processed(&self) -> usize {
        self.local + self.stolen
    }
}

/// Shared context of one work-stealing phase: one queue per worker plus the
/// count of workers whose own queue has run dry. Built at phase start, dropped
/// when the phase ends.
#[derive(Debug)]
pub struct StealPhase<D> {
    queues: Vec<D>,
    exhausted: AtomicUsize,
}

impl<D: IndexDeque> StealPhase<D> {
    pub fn new(ranges: &[Range<usize>]) -> Self {
        Self {
            queues: ranges.iter().cloned().map(D::from_range).collect(),
            exhausted: AtomicUsize::new(0),
        }
    }

    pub fn workers(&self) -> usize {
        self.queues.len()
    }

    pub fn queue(&self, worker: usize) -> &D {
        &self.queues[worker]
    }

    /// True once every worker has drained its own queue.
    pub fn is_complete(&self) -> bool {
        self.exhausted.load(Ordering::SeqCst) >= self.queues.len()
    }

    /// Runs `work` on indices from `worker`'s own queue, then on indices stolen
    /// from randomly chosen queues until every worker has reported its own
    /// queue empty. Each worker index must call this exactly once.
    pub fn run<F: FnMut(usize)>(&self, worker: usize, mut work: F) -> PhaseStats {
        let mut stats = PhaseStats::default();

        let own = &self.queues[worker];
        while let Some(index) = own.pop_bottom() {
            work(index);
            stats.local += 1;
        }
        self.exhausted.fetch_add(1, Ordering::SeqCst);

        let mut rng = rand::rng();
        let mut misses: u32 = 0;
        while !self.is_complete() {
            let victim = rng.random_range(0..self.queues.len());
            match self.queues[victim].pop_top() {
                Some(index) => {
                    work(index);
                    stats.stolen += 1;
                    misses = 0;
                }
                None => {
                    stats.failed_steals += 1;
                    backoff(misses);
                    misses = misses.saturating_add(1);
                }
            }
        }

        stats
    }
}

fn backoff(misses: u32) {
    if misses < SPIN_ATTEMPTS {
        for _ in 0..(1u32 << misses) {
            hint::spin_loop();
        }
    } else {
        thread::yield_now();
    }
}
