use std::sync::{Condvar, Mutex, PoisonError};
use crate::concurrency::lock;

/// Single-use rendezvous for a fixed number of participants.
///
/// Every call to [`PhaseBarrier::arrive`] blocks until `parties` calls have been
/// made. The barrier does not reset: build a fresh one for every phase boundary.
/// If fewer than `parties` threads ever arrive, the ones that did stay blocked.
///
/// # Examples
///
/// ```
/// use bh_engine::concurrency::PhaseBarrier;
///
/// let barrier = PhaseBarrier::new(3);
/// let leaders: usize = std::thread::scope(|s| {
///     let handles: Vec<_> = (0..3).map(|_| s.spawn(|| barrier.arrive())).collect();
///     handles.into_iter().map(|h| h.join().unwrap() as usize).sum()
/// });
/// assert_eq!(leaders, 1);
/// ```
#[derive(Debug)]
pub struct PhaseBarrier {
    arrived: Mutex<usize>,
    released: Condvar,
    parties: usize,
}

impl PhaseBarrier {
    pub fn new(parties: usize) -> Self {
        Self {
            arrived: Mutex::new(0),
            released: Condvar::new(),
            parties,
        }
    }

    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Number of participants that have arrived so far.
    pub fn arrived(&self) -> usize {
        *lock(&self.arrived)
    }

    /// Blocks until all participants have arrived. Returns `true` for the
    /// arrival that released the others.
    pub fn arrive(&self) -> bool {
        let mut arrived = lock(&self.arrived);
        *arrived += 1;
        if *arrived < self.parties {
            let _released = self
                .released
                .wait_while(arrived, |n| *n < self.parties)
                .unwrap_or_else(PoisonError::into_inner);
            false
        } else {
            self.released.notify_all();
            *arrived == self.parties
        }
    }
}
