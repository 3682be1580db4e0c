use std::ops::Range;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering::SeqCst};
use std::sync::Mutex;
use crate::concurrency::lock;

/// A double-ended queue over a fixed range of particle indices.
///
/// The owning worker takes indices from the bottom (the high end of the range),
/// thieves take them from the top (the low end). Over the lifetime of a queue
/// every index of its range is handed out at most once.
pub trait IndexDeque: Send + Sync {
    fn from_range(range: Range<usize>) -> Self
    where
        Self: Sized;

    /// The range the queue was built with.
    fn range(&self) -> Range<usize>;

    /// Owner-only. Returns `None` once the queue is empty.
    fn pop_bottom(&self) -> Option<usize>;

    /// Safe from any thread. `None` means the queue was empty or the attempt
    /// lost a race; callers retry elsewhere.
    fn pop_top(&self) -> Option<usize>;
}

fn pack(idx: u32, stamp: u32) -> u64 {
    ((stamp as u64) << 32) | idx as u64
}

fn unpack(word: u64) -> (usize, u32) {
    ((word & u32::MAX as u64) as usize, (word >> 32) as u32)
}

/// Lock-free deque whose top is a stamped reference (index plus a counter
/// bumped on every change) updated by compare-and-swap.
///
/// # Examples
///
/// ```
/// use bh_engine::concurrency::{IndexDeque, StampedDeque};
///
/// let deque = StampedDeque::from_range(3..6);
/// assert_eq!(deque.pop_bottom(), Some(5));
/// assert_eq!(deque.pop_top(), Some(3));
/// assert_eq!(deque.pop_bottom(), Some(4));
/// assert_eq!(deque.pop_bottom(), None);
/// assert_eq!(deque.pop_top(), None);
/// ```
#[derive(Debug)]
pub struct StampedDeque {
    start: usize,
    end: usize,
    bottom: AtomicUsize,
    top: AtomicU64,
}

impl StampedDeque {
    /// Current top index and stamp.
    pub fn top(&self) -> (usize, u32) {
        unpack(self.top.load(SeqCst))
    }
}

impl IndexDeque for StampedDeque {
    fn from_range(range: Range<usize>) -> Self {
        assert!(
            range.end <= u32::MAX as usize,
            "deque range {:?} exceeds the stamped index width",
            range
        );
        let start = range.start.min(range.end);
        Self {
            start,
            end: range.end,
            bottom: AtomicUsize::new(range.end),
            top: AtomicU64::new(pack(start as u32, 0)),
        }
    }

    fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    fn pop_bottom(&self) -> Option<usize> {
        let bottom = self.bottom.load(SeqCst);
        if bottom == self.start {
            return None;
        }
        let bottom = bottom - 1;
        self.bottom.store(bottom, SeqCst);

        let old_top = self.top.load(SeqCst);
        let (top, stamp) = unpack(old_top);
        if bottom > top {
            return Some(bottom);
        }

        // At most one index is left; a thief may be racing for it. Either way
        // the queue ends up empty and reset to its start.
        self.bottom.store(self.start, SeqCst);
        let reset = pack(self.start as u32, stamp.wrapping_add(1));
        if bottom == top && self.top.compare_exchange(old_top, reset, SeqCst, SeqCst).is_ok() {
            return Some(bottom);
        }
        self.top.store(reset, SeqCst);
        None
    }

    fn pop_top(&self) -> Option<usize> {
        let old_top = self.top.load(SeqCst);
        let (top, stamp) = unpack(old_top);
        if self.bottom.load(SeqCst) <= top {
            return None;
        }
        let new_top = pack(top as u32 + 1, stamp.wrapping_add(1));
        self.top
            .compare_exchange(old_top, new_top, SeqCst, SeqCst)
            .ok()
            .map(|_| top)
    }
}

#[derive(Debug)]
struct Cursors {
    bottom: usize,
    top: usize,
}

/// Deque with both ends behind one mutex. Strictly serializing, so it serves as
/// the reference behaviour for [`StampedDeque`].
#[derive(Debug)]
pub struct LockedDeque {
    start: usize,
    end: usize,
    cursors: Mutex<Cursors>,
}

impl IndexDeque for LockedDeque {
    fn from_range(range: Range<usize>) -> Self {
        let start = range.start.min(range.end);
        Self {
            start,
            end: range.end,
            cursors: Mutex::new(Cursors { bottom: range.end, top: start }),
        }
    }

    fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    fn pop_bottom(&self) -> Option<usize> {
        let mut cursors = lock(&self.cursors);
        if cursors.bottom <= cursors.top {
            return None;
        }
        cursors.bottom -= 1;
        Some(cursors.bottom)
    }

    fn pop_top(&self) -> Option<usize> {
        let mut cursors = lock(&self.cursors);
        if cursors.bottom <= cursors.top {
            return None;
        }
        cursors.top += 1;
        Some(cursors.top - 1)
    }
}
