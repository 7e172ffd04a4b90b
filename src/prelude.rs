//! A "prelude" for users of the `timer_heap` crate.
//!
//! This prelude is similar to the standard library's prelude in that you'll
//! almost always want to import its entire contents, but unlike the standard
//! library's prelude you'll have to do so manually:
//!
//! ```
//! use timer_heap::prelude::*;
//! ```
//!
//! The prelude may grow over time as additional items see ubiquitous use.

pub use crate::error::*;
pub use crate::timer::heap::TimerHeap;
pub use crate::timer::table::TaskTable;
pub use crate::timer::task::{ScheduledTask, TaskId, Timeout};

pub use anyhow::{anyhow, Result as AnyResult};
pub use thiserror::Error;

pub(crate) use log::{debug, trace};
pub(crate) use std::time::Duration;
