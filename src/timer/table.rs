//! Owning store of `ScheduledTask` records, keyed by task id.

use crate::prelude::*;
use std::collections::HashMap;

/// The task records the scheduler owns, keyed by task id.
///
/// `TaskTable` is based on HashMap, it's easy to add a record and find it.
/// The heap never owns records; every heap operation borrows the table to
/// read deadlines and to update each record's heap index.
#[derive(Debug, Default)]
pub struct TaskTable {
    task_map: HashMap<TaskId, ScheduledTask>,
}

impl TaskTable {
    pub fn new() -> Self {
        TaskTable {
            task_map: HashMap::new(),
        }
    }

    /// Number of registered records (queued or not).
    pub fn len(&self) -> usize {
        self.task_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.task_map.is_empty()
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        self.task_map.contains_key(&task_id)
    }

    /// Register a record, returning the record it replaced, if any.
    ///
    /// Replacing a record that is still queued would leave the heap holding
    /// a slot whose index field just went blank, so that case fails with
    /// [`HeapError::TaskStillQueued`] and nothing changes.
    pub fn add_task(&mut self, task: ScheduledTask) -> Result<Option<ScheduledTask>, HeapError> {
        if let Some(previous) = self.task_map.get(&task.task_id) {
            if previous.is_queued() {
                return Err(HeapError::TaskStillQueued(task.task_id));
            }
        }

        Ok(self.task_map.insert(task.task_id, task))
    }

    /// Drop a record, returning it.
    ///
    /// A queued record must be erased from the heap first; removing it here
    /// would dangle the heap's slot, so that case fails with
    /// [`HeapError::TaskStillQueued`] and nothing changes.
    pub fn remove_task(&mut self, task_id: TaskId) -> Result<Option<ScheduledTask>, HeapError> {
        if let Some(task) = self.task_map.get(&task_id) {
            if task.is_queued() {
                return Err(HeapError::TaskStillQueued(task_id));
            }
        }

        Ok(self.task_map.remove(&task_id))
    }

    pub fn get(&self, task_id: TaskId) -> Option<&ScheduledTask> {
        self.task_map.get(&task_id)
    }

    pub fn get_mut(&mut self, task_id: TaskId) -> Option<&mut ScheduledTask> {
        self.task_map.get_mut(&task_id)
    }

    // Infallible accessors for ids the heap already holds. A miss means the
    // erase-before-remove contract was broken by the table's owner.
    pub(crate) fn record(&self, task_id: TaskId) -> &ScheduledTask {
        match self.task_map.get(&task_id) {
            Some(task) => task,
            None => panic!("task `{}` is queued but has no record", task_id),
        }
    }

    pub(crate) fn record_mut(&mut self, task_id: TaskId) -> &mut ScheduledTask {
        match self.task_map.get_mut(&task_id) {
            Some(task) => task,
            None => panic!("task `{}` is queued but has no record", task_id),
        }
    }

    pub(crate) fn timeout_of(&self, task_id: TaskId) -> Timeout {
        self.record(task_id).timeout()
    }
}
