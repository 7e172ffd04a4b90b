//! Public error of timer-heap.

use crate::prelude::*;
use std::collections::TryReserveError;

/// Error enumeration for `TimerHeap`-related operations.
#[derive(Error, Debug)]
pub enum HeapError {
    /// The heap's backing array could not be grown.
    ///
    /// The heap and every task record are left exactly as they were before
    /// the failing call.
    #[error("The heap's backing array could not be grown.")]
    ResourceExhausted(#[from] TryReserveError),
    /// The task is not currently queued in the heap.
    #[error("Task `{0}` is not queued in the heap.")]
    TaskNotQueued(TaskId),
    /// The task id has no record in the `TaskTable`.
    #[error("Task `{0}` is not registered in the task table.")]
    TaskNotRegistered(TaskId),
    /// The table mutation would orphan a slot the heap still references.
    #[error("Task `{0}` is still queued in the heap, erase it first.")]
    TaskStillQueued(TaskId),
}
