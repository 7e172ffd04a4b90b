//! timer_heap is the deadline-ordering core of a timer-driven scheduler:
//! an index-tracked binary min-heap over externally owned task records.
//!
//! # timer_heap
//!
//! A plain binary heap answers "which task is due first?" but cannot cancel
//! or re-schedule an arbitrary queued task without an O(n) scan. In a
//! long-running event loop, cancellation and rearm are the dominant timer
//! operations, so every [`ScheduledTask`](timer::task::ScheduledTask)
//! carries its own heap position. That one back-reference buys:
//!
//! 1. O(log n) removal of any queued task ([`erase`](timer::heap::TimerHeap::erase)).
//!
//! 2. O(log n) re-ordering after a deadline change ([`adjust`](timer::heap::TimerHeap::adjust)).
//!
//! 3. O(1) "is this still the next deadline?" checks ([`is_top`](timer::task::ScheduledTask::is_top)).
//!
//! The heap itself never owns task records; it holds task ids and walks a
//! [`TaskTable`](timer::table::TaskTable) that the surrounding scheduler
//! owns. Everything is single-threaded and non-blocking; the caller
//! serializes access.
//!
//! # Example
//!
//! ```
//! use timer_heap::prelude::*;
//!
//! fn main() -> AnyResult<()> {
//!     let mut tasks = TaskTable::new();
//!     let mut heap = TimerHeap::new();
//!
//!     tasks.add_task(ScheduledTask::new(1, Timeout::from_secs(30)))?;
//!     tasks.add_task(ScheduledTask::new(2, Timeout::from_secs(10)))?;
//!
//!     heap.push(1, &mut tasks)?;
//!     heap.push(2, &mut tasks)?;
//!
//!     // Task 2 is due first.
//!     assert_eq!(heap.top(), Some(2));
//!
//!     // Task 1 got rearmed to an earlier deadline.
//!     tasks.get_mut(1).unwrap().set_timeout(Timeout::from_secs(5));
//!     heap.adjust(1, &mut tasks)?;
//!     assert_eq!(heap.top(), Some(1));
//!
//!     // Task 2 got cancelled outright.
//!     heap.erase(2, &mut tasks)?;
//!     assert_eq!(heap.len(), 1);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod prelude;
pub mod timer;
