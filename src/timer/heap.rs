//! The index-tracked min-heap that orders pending tasks by deadline.
//!
//! Classic array-shaped binary heap, with one twist: every structural move
//! writes the moved task's position back into its record. That
//! back-reference is what makes `erase` and `adjust` O(log n) instead of a
//! linear hunt for the task. In a timer-driven scheduler, cancel and rearm
//! happen far more often than expiry.

use crate::prelude::*;

/// First allocation of the backing array; afterwards capacity doubles.
const MIN_CAPACITY: usize = 8;

/// A binary min-heap of task ids, ordered by each task's deadline.
///
/// The heap owns nothing but its backing array of ids. Task records live in
/// a [`TaskTable`] that every operation borrows; the heap reads deadlines
/// from it and writes each record's `heap_index` as slots move.
///
/// # Invariants
///
/// - For every slot `i > 0`: `timeout(slots[(i - 1) / 2]) <= timeout(slots[i])`.
/// - For every slot `i`: the record of `slots[i]` has `heap_index == Some(i)`;
///   every record not in the array has `heap_index == None`.
/// - A record belongs to at most one heap at a time.
///
/// Single-threaded by design. Each call either completes fully or, when the
/// backing array cannot grow, fails leaving heap and records untouched.
///
/// Dropping the heap releases only its own array; records still queued at
/// that point keep their stale positions. Call [`clear`](Self::clear) first
/// when the records outlive the heap.
#[derive(Debug, Default)]
pub struct TimerHeap {
    slots: Vec<TaskId>,
}

impl TimerHeap {
    /// An empty heap. Allocates nothing until the first push or reserve.
    pub fn new() -> Self {
        TimerHeap { slots: Vec::new() }
    }

    /// An empty heap with room for `capacity` tasks pre-allocated.
    pub fn with_capacity(capacity: usize) -> Self {
        TimerHeap {
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current capacity of the backing array.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// The task with the earliest deadline, without removing it.
    pub fn top(&self) -> Option<TaskId> {
        self.slots.first().copied()
    }

    /// The earliest queued deadline, for computing the next poll wakeup.
    pub fn top_timeout(&self, tasks: &TaskTable) -> Option<Timeout> {
        self.slots.first().map(|&task_id| tasks.timeout_of(task_id))
    }

    /// Queued task ids in backing-array order (root first, then level by
    /// level). Mainly useful for diagnostics and invariant checks.
    pub fn iter(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.slots.iter().copied()
    }

    /// Ensure the backing array can hold at least `capacity` tasks.
    ///
    /// Growth is geometric: the new capacity is `capacity` or double the
    /// current one (first allocation: eight slots), whichever is larger, so
    /// pushes stay amortized O(1). On allocation failure the heap keeps
    /// its previous state and the error propagates.
    pub fn reserve(&mut self, capacity: usize) -> Result<(), HeapError> {
        let current = self.slots.capacity();
        if current >= capacity {
            return Ok(());
        }

        let mut grown = if current == 0 {
            MIN_CAPACITY
        } else {
            current * 2
        };
        if grown < capacity {
            grown = capacity;
        }

        self.slots.try_reserve_exact(grown - self.slots.len())?;
        debug!("timer-heap capacity grown: {} -> {}", current, grown);
        Ok(())
    }

    /// Queue a registered task, restoring heap order by a conditional
    /// sift-up from the new leaf.
    ///
    /// The record must not already be queued; that precondition is the
    /// caller's (use [`adjust`](Self::adjust) when membership is unknown).
    /// Fails with [`HeapError::TaskNotRegistered`] for an unknown id and
    /// with [`HeapError::ResourceExhausted`] when the backing array cannot
    /// grow; in both cases nothing is mutated and the record stays
    /// unqueued.
    pub fn push(&mut self, task_id: TaskId, tasks: &mut TaskTable) -> Result<(), HeapError> {
        let timeout = {
            let task = tasks
                .get(task_id)
                .ok_or(HeapError::TaskNotRegistered(task_id))?;
            debug_assert!(!task.is_queued(), "task `{}` is already queued", task_id);
            task.timeout()
        };

        self.reserve(self.slots.len() + 1)?;

        // Capacity is ensured, this append cannot reallocate.
        let hole = self.slots.len();
        self.slots.push(task_id);
        self.sift_up(hole, task_id, timeout, tasks);

        trace!("pushed task `{}`, heap size {}", task_id, self.slots.len());
        Ok(())
    }

    /// Remove and return the task with the earliest deadline.
    ///
    /// An empty heap yields `None` (not an error). The vacated root is
    /// refilled with the former last leaf, sifted down; the popped record's
    /// heap index reverts to the "not queued" sentinel.
    pub fn pop(&mut self, tasks: &mut TaskTable) -> Option<TaskId> {
        let top = *self.slots.first()?;
        let last = self.slots.pop()?;

        if !self.slots.is_empty() {
            let timeout = tasks.timeout_of(last);
            self.sift_down(0, last, timeout, tasks);
        }

        tasks.record_mut(top).set_heap_index(None);
        trace!("popped task `{}`, heap size {}", top, self.slots.len());
        Some(top)
    }

    /// Like [`pop`](Self::pop), but only if the earliest deadline is at or
    /// before `now`. The dispatch loop drains arrived tasks with this.
    pub fn pop_due(&mut self, now: Timeout, tasks: &mut TaskTable) -> Option<TaskId> {
        let top = *self.slots.first()?;
        if tasks.timeout_of(top) > now {
            return None;
        }

        self.pop(tasks)
    }

    /// Remove a task from wherever it sits in the heap.
    ///
    /// Fails with [`HeapError::TaskNotQueued`] (no mutation) when the record
    /// is not a member. Otherwise the vacated slot is refilled with the
    /// former last leaf. The subtree below the slot already satisfied heap
    /// order against the removed value, so the replacement can violate order
    /// in only one direction: against the ancestor chain when it is earlier
    /// than the slot's parent, against the descendants otherwise, never
    /// both. One directional sift restores the heap. When the replacement
    /// must go up, its first move is already proven necessary, hence the
    /// unconditional sift-up variant.
    pub fn erase(&mut self, task_id: TaskId, tasks: &mut TaskTable) -> Result<(), HeapError> {
        let position = tasks
            .get(task_id)
            .ok_or(HeapError::TaskNotRegistered(task_id))?
            .heap_index()
            .ok_or(HeapError::TaskNotQueued(task_id))?;

        debug_assert_eq!(self.slots.get(position).copied(), Some(task_id));

        let last = match self.slots.pop() {
            Some(last) => last,
            None => panic!("task `{}` claims position {} in an empty heap", task_id, position),
        };

        // When the erased task was itself the last leaf there is no hole to
        // refill.
        if position < self.slots.len() {
            let timeout = tasks.timeout_of(last);
            if position > 0 && tasks.timeout_of(self.slots[(position - 1) / 2]) > timeout {
                self.sift_up_unconditional(position, last, timeout, tasks);
            } else {
                self.sift_down(position, last, timeout, tasks);
            }
        }

        tasks.record_mut(task_id).set_heap_index(None);
        trace!("erased task `{}` from position {}", task_id, position);
        Ok(())
    }

    /// Re-order a task whose deadline changed, or queue it if it is not a
    /// member yet.
    ///
    /// Only one entry changed one field, so the same one-directional
    /// argument as [`erase`](Self::erase) applies: the task sifts up
    /// (unconditionally, its first move being already proven) when it became
    /// earlier than its parent, and sifts down otherwise.
    pub fn adjust(&mut self, task_id: TaskId, tasks: &mut TaskTable) -> Result<(), HeapError> {
        let (position, timeout) = {
            let task = tasks
                .get(task_id)
                .ok_or(HeapError::TaskNotRegistered(task_id))?;
            (task.heap_index(), task.timeout())
        };

        let position = match position {
            None => return self.push(task_id, tasks),
            Some(position) => position,
        };

        debug_assert_eq!(self.slots.get(position).copied(), Some(task_id));

        if position > 0 && tasks.timeout_of(self.slots[(position - 1) / 2]) > timeout {
            self.sift_up_unconditional(position, task_id, timeout, tasks);
        } else {
            self.sift_down(position, task_id, timeout, tasks);
        }

        trace!("adjusted task `{}`", task_id);
        Ok(())
    }

    /// Drop every queued task, reverting each record's heap index to the
    /// "not queued" sentinel. The records themselves stay in the table.
    pub fn clear(&mut self, tasks: &mut TaskTable) {
        for task_id in self.slots.drain(..) {
            tasks.record_mut(task_id).set_heap_index(None);
        }
    }

    /// Walk `task_id` from `hole` toward the root while its deadline is
    /// earlier than the parent's, moving each displaced parent down into the
    /// hole (and re-indexing it), then write the task into the final hole.
    fn sift_up(&mut self, mut hole: usize, task_id: TaskId, timeout: Timeout, tasks: &mut TaskTable) {
        while hole > 0 {
            let parent = (hole - 1) / 2;
            let parent_id = self.slots[parent];
            if tasks.timeout_of(parent_id) <= timeout {
                break;
            }
            self.slots[hole] = parent_id;
            tasks.record_mut(parent_id).set_heap_index(Some(hole));
            hole = parent;
        }

        self.slots[hole] = task_id;
        tasks.record_mut(task_id).set_heap_index(Some(hole));
    }

    /// Same movement rule as [`sift_up`](Self::sift_up), but the first
    /// parent move happens before the stop condition is ever tested.
    ///
    /// `erase` and `adjust` call this only after establishing that the
    /// task's deadline beats the parent at `hole`, so re-testing would be a
    /// wasted comparison, and for a value equal to the parent it would stop
    /// a move that must happen. Kept separate from the conditional variant
    /// on purpose.
    fn sift_up_unconditional(
        &mut self,
        mut hole: usize,
        task_id: TaskId,
        timeout: Timeout,
        tasks: &mut TaskTable,
    ) {
        debug_assert!(hole > 0, "unconditional sift-up from the root");

        loop {
            let parent = (hole - 1) / 2;
            let parent_id = self.slots[parent];
            self.slots[hole] = parent_id;
            tasks.record_mut(parent_id).set_heap_index(Some(hole));
            hole = parent;

            if hole == 0 {
                break;
            }
            let parent = (hole - 1) / 2;
            if tasks.timeout_of(self.slots[parent]) <= timeout {
                break;
            }
        }

        self.slots[hole] = task_id;
        tasks.record_mut(task_id).set_heap_index(Some(hole));
    }

    /// Walk `task_id` from `hole` toward the leaves, moving the
    /// earlier-deadlined child up into the hole (and re-indexing it) until
    /// neither child is earlier, then write the task into the final hole.
    fn sift_down(&mut self, mut hole: usize, task_id: TaskId, timeout: Timeout, tasks: &mut TaskTable) {
        let n = self.slots.len();
        // One past the left child; `child <= n` means the left child exists.
        let mut child = 2 * (hole + 1);

        while child <= n {
            // Prefer the left child when the right one is missing or later.
            if child == n
                || tasks.timeout_of(self.slots[child]) > tasks.timeout_of(self.slots[child - 1])
            {
                child -= 1;
            }

            let child_id = self.slots[child];
            if timeout <= tasks.timeout_of(child_id) {
                break;
            }

            self.slots[hole] = child_id;
            tasks.record_mut(child_id).set_heap_index(Some(hole));
            hole = child;
            child = 2 * (hole + 1);
        }

        self.slots[hole] = task_id;
        tasks.record_mut(task_id).set_heap_index(Some(hole));
    }
}
