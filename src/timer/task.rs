//! Task records ordered by the heap, and the `Timeout` deadline key.

use crate::prelude::*;
use std::ops::Add;
use std::time::SystemTime;

/// Unique identity of a scheduled task, assigned by the task's owner.
pub type TaskId = u64;

const MICROS_PER_SEC: u64 = 1_000_000;

/// The deadline key tasks are ordered by: whole seconds plus a sub-second
/// fraction in microseconds.
///
/// Comparison is lexicographic (seconds first, then fraction), which the
/// derived `Ord` provides thanks to the field order. The heap only ever asks
/// "is `a` strictly later than `b`", so ties between equal deadlines are
/// left wherever the heap shape puts them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timeout {
    sec: u64,
    subsec_micros: u32,
}

impl Timeout {
    /// Build a deadline from seconds and microseconds, carrying any
    /// microsecond overflow into the seconds.
    pub fn new(sec: u64, subsec_micros: u32) -> Self {
        let carry = subsec_micros as u64 / MICROS_PER_SEC;
        Timeout {
            sec: sec + carry,
            subsec_micros: (subsec_micros as u64 % MICROS_PER_SEC) as u32,
        }
    }

    /// A whole-second deadline.
    pub fn from_secs(sec: u64) -> Self {
        Timeout {
            sec,
            subsec_micros: 0,
        }
    }

    //TODO: Since the system clock may be adjusted,
    // an internal time should be maintained
    // to get rid of system interference.
    /// The current OS SystemTime as a deadline.
    pub fn now() -> Self {
        match SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
            Ok(n) => Timeout::new(n.as_secs(), n.subsec_micros()),
            Err(_) => panic!("SystemTime before UNIX EPOCH!"),
        }
    }

    /// A deadline `duration` from now.
    pub fn after(duration: Duration) -> Self {
        Timeout::now() + duration
    }

    /// Whole seconds of the deadline.
    pub fn sec(&self) -> u64 {
        self.sec
    }

    /// Sub-second fraction of the deadline, in microseconds.
    pub fn subsec_micros(&self) -> u32 {
        self.subsec_micros
    }
}

impl Add<Duration> for Timeout {
    type Output = Timeout;

    fn add(self, rhs: Duration) -> Timeout {
        Timeout::new(
            self.sec + rhs.as_secs(),
            self.subsec_micros + rhs.subsec_micros(),
        )
    }
}

/// A pending timed task as the heap sees it: an identity, a deadline, and
/// the back-reference into the heap's array.
///
/// The record is owned by a [`TaskTable`](crate::timer::table::TaskTable),
/// never by the heap. While the task is queued, the heap is the only writer
/// of `heap_index`; the owner may read it (e.g. via [`is_top`](Self::is_top))
/// but mutates only the deadline, and then must call
/// [`TimerHeap::adjust`](crate::timer::heap::TimerHeap::adjust) to restore
/// ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    /// Identity of the task, the key it is queued and cancelled by.
    pub task_id: TaskId,
    timeout: Timeout,
    // `None` is the "not a member of any heap" sentinel.
    heap_index: Option<usize>,
}

impl ScheduledTask {
    /// A fresh record, not yet a member of any heap.
    pub fn new(task_id: TaskId, timeout: Timeout) -> Self {
        ScheduledTask {
            task_id,
            timeout,
            heap_index: None,
        }
    }

    /// The task's current deadline.
    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    /// Re-arm the task with a new deadline.
    ///
    /// If the task is currently queued this leaves the heap order stale;
    /// follow up with `TimerHeap::adjust` before the next pop.
    pub fn set_timeout(&mut self, timeout: Timeout) {
        self.timeout = timeout;
    }

    /// The task's position in the heap's array, or `None` when it is not a
    /// member of any heap.
    pub fn heap_index(&self) -> Option<usize> {
        self.heap_index
    }

    /// Whether the task is currently a member of a heap.
    pub fn is_queued(&self) -> bool {
        self.heap_index.is_some()
    }

    /// Whether the task currently holds the earliest deadline in the heap.
    ///
    /// O(1), no search: true iff the task sits at the heap's root. Lets a
    /// dispatch loop detect that its cached "next wakeup" went stale after
    /// some task was rearmed, without asking the heap anything.
    pub fn is_top(&self) -> bool {
        self.heap_index == Some(0)
    }

    pub(crate) fn set_heap_index(&mut self, heap_index: Option<usize>) {
        self.heap_index = heap_index;
    }
}
