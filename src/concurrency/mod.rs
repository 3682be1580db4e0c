mod phase_barrier;
mod work_stealing_deque;
mod steal_phase;

pub use phase_barrier::*;
pub use work_stealing_deque::*;
pub use steal_phase::*;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `mutex`, ignoring poisoning. A poisoned guard means another worker
/// already panicked, which is fatal for the step anyway.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
