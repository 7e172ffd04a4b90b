use timer_heap::prelude::*;

use pretty_assertions::assert_eq;
use rand::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Re-derive both heap invariants from the public surface: every queued id
/// reports the slot it sits in, and every slot's deadline is at or after its
/// parent's.
fn validate(heap: &TimerHeap, tasks: &TaskTable) {
    let ids: Vec<TaskId> = heap.iter().collect();
    for (i, &id) in ids.iter().enumerate() {
        assert_eq!(tasks.get(id).unwrap().heap_index(), Some(i));
        if i > 0 {
            let parent = tasks.get(ids[(i - 1) / 2]).unwrap().timeout();
            let child = tasks.get(id).unwrap().timeout();
            assert!(parent <= child, "heap order broken at slot {}", i);
        }
    }
}

#[test]
fn test_thousand_task_churn() -> AnyResult<()> {
    init_logger();

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut tasks = TaskTable::new();
    let mut heap = TimerHeap::new();

    let mut ids: Vec<TaskId> = (0..1000).collect();
    ids.shuffle(&mut rng);
    for &id in ids.iter() {
        // Duplicated deadlines on purpose; ties may pop in any order.
        let deadline = Timeout::new(rng.gen_range(0..500), rng.gen_range(0..1_000_000));
        tasks.add_task(ScheduledTask::new(id, deadline))?;
        heap.push(id, &mut tasks)?;
    }
    assert_eq!(heap.len(), 1000);
    validate(&heap, &tasks);

    // Growth never dropped or duplicated anything.
    let mut seen = HashSet::new();
    let mut previous = Timeout::default();
    while let Some(id) = heap.pop(&mut tasks) {
        let task = tasks.get(id).unwrap();
        assert!(seen.insert(id), "task {} popped twice", id);
        assert!(previous <= task.timeout(), "pops went backwards");
        assert_eq!(task.heap_index(), None);
        previous = task.timeout();
    }
    assert_eq!(seen.len(), 1000);
    assert!(heap.is_empty());

    Ok(())
}

#[test]
fn test_random_churn_keeps_invariants() -> AnyResult<()> {
    init_logger();

    let mut rng = StdRng::seed_from_u64(42);
    let mut tasks = TaskTable::new();
    let mut heap = TimerHeap::new();

    for id in 0..256u64 {
        tasks.add_task(ScheduledTask::new(id, Timeout::from_secs(rng.gen_range(0..1_000))))?;
    }

    for round in 0..4_096u32 {
        let id = rng.gen_range(0..256u64);
        match round % 4 {
            0 => {
                // Queue it if it is loose, otherwise cancel it.
                if tasks.get(id).unwrap().is_queued() {
                    heap.erase(id, &mut tasks)?;
                } else {
                    heap.push(id, &mut tasks)?;
                }
            }
            1 => {
                tasks
                    .get_mut(id)
                    .unwrap()
                    .set_timeout(Timeout::from_secs(rng.gen_range(0..1_000)));
                // Rearm; queues the task as a side effect when it was loose.
                heap.adjust(id, &mut tasks)?;
            }
            2 => {
                if let Some(popped) = heap.pop(&mut tasks) {
                    assert_eq!(tasks.get(popped).unwrap().heap_index(), None);
                }
            }
            _ => {
                let result = heap.erase(id, &mut tasks);
                if tasks.get(id).unwrap().is_queued() {
                    panic!("erase left task {} queued", id);
                }
                if let Err(error) = result {
                    assert!(matches!(error, HeapError::TaskNotQueued(_)));
                }
            }
        }
        validate(&heap, &tasks);
    }

    // Whatever survived still drains in deadline order.
    let mut previous = Timeout::default();
    while let Some(id) = heap.pop(&mut tasks) {
        let timeout = tasks.get(id).unwrap().timeout();
        assert!(previous <= timeout);
        previous = timeout;
    }

    Ok(())
}

#[test]
fn test_dispatch_loop_with_periodic_rearm() -> AnyResult<()> {
    init_logger();

    let mut tasks = TaskTable::new();
    let mut heap = TimerHeap::new();

    // Three periodic tasks on a virtual clock: every 2s, 3s and 5s.
    let periods: [(TaskId, u64); 3] = [(1, 2), (2, 3), (3, 5)];
    for &(id, period) in periods.iter() {
        tasks.add_task(ScheduledTask::new(id, Timeout::from_secs(period)))?;
        heap.push(id, &mut tasks)?;
    }

    let mut fired = Vec::new();
    for now in 0..=30u64 {
        let now = Timeout::from_secs(now);
        while let Some(id) = heap.pop_due(now, &mut tasks) {
            fired.push((now.sec(), id));

            // Rearm one period ahead and requeue.
            let period = periods.iter().find(|&&(p, _)| p == id).unwrap().1;
            let task = tasks.get_mut(id).unwrap();
            let next = task.timeout() + Duration::from_secs(period);
            task.set_timeout(next);
            heap.adjust(id, &mut tasks)?;
        }
        validate(&heap, &tasks);
        // Nothing due is ever left queued past its deadline.
        if let Some(next) = heap.top_timeout(&tasks) {
            assert!(next > now);
        }
    }

    // Every task fired floor(30 / period) times, at its own multiples.
    for &(id, period) in periods.iter() {
        let firings: Vec<u64> = fired
            .iter()
            .filter(|&&(_, fired_id)| fired_id == id)
            .map(|&(at, _)| at)
            .collect();
        let expected: Vec<u64> = (1..=30 / period).map(|k| k * period).collect();
        assert_eq!(firings, expected, "task {} misfired", id);
    }

    Ok(())
}

#[test]
fn test_top_tracking_across_rearms() -> AnyResult<()> {
    init_logger();

    let mut tasks = TaskTable::new();
    let mut heap = TimerHeap::new();

    tasks.add_task(ScheduledTask::new(1, Timeout::from_secs(10)))?;
    tasks.add_task(ScheduledTask::new(2, Timeout::from_secs(20)))?;
    heap.push(1, &mut tasks)?;
    heap.push(2, &mut tasks)?;
    assert!(tasks.get(1).unwrap().is_top());

    // A dispatch loop sleeping until task 1 can see, in O(1), that its
    // cached wakeup went stale when task 2 moved ahead of it.
    tasks.get_mut(2).unwrap().set_timeout(Timeout::from_secs(5));
    heap.adjust(2, &mut tasks)?;
    assert!(!tasks.get(1).unwrap().is_top());
    assert!(tasks.get(2).unwrap().is_top());
    assert_eq!(heap.top_timeout(&tasks), Some(Timeout::from_secs(5)));

    Ok(())
}

#[test]
fn test_table_guards_during_scheduling() -> AnyResult<()> {
    init_logger();

    let mut tasks = TaskTable::new();
    let mut heap = TimerHeap::new();

    tasks.add_task(ScheduledTask::new(7, Timeout::from_secs(1)))?;
    heap.push(7, &mut tasks)?;

    // A queued record cannot be replaced or dropped out from under the heap.
    assert!(matches!(
        tasks.add_task(ScheduledTask::new(7, Timeout::from_secs(2))),
        Err(HeapError::TaskStillQueued(7))
    ));
    assert!(matches!(
        tasks.remove_task(7),
        Err(HeapError::TaskStillQueued(7))
    ));

    heap.erase(7, &mut tasks)?;
    let record = tasks.remove_task(7)?.unwrap();
    assert_eq!(record.heap_index(), None);
    assert!(tasks.is_empty());

    Ok(())
}
