use crate::Host;
use crate::budget::{BudgetOutcome, BudgetWindow};
use crate::error::SchedulerError;
use crate::priority::PriorityLevel;
use crate::queue::{Task, TaskQueue};
use crate::registry::QueueRegistry;
use std::cell::RefCell;

/// Give every queue registered at `priority` one turn, round robin, until the
/// window is spent.
///
/// Each queue is taken off the front of the registry, given its turn and put back
/// at the end, so the next invocation starts with the queue that waited longest.
/// The registry is never borrowed while a task runs: tasks are free to register
/// or unregister queues.
pub(crate) fn process_queues<H: Host>(
    registry: &RefCell<QueueRegistry>,
    host: &H,
    priority: PriorityLevel,
    window: BudgetWindow,
) -> Result<BudgetOutcome, SchedulerError> {
    // Queues registered during this pass wait for the next one.
    let turns = registry.borrow().len(priority);

    for _ in 0..turns {
        let Some(queue) = registry.borrow_mut().begin_turn(priority) else {
            break;
        };
        let outcome = run_turn(&queue, host, priority, window);
        if !registry.borrow_mut().end_turn(priority, queue) {
            tracing::trace!(%priority, "queue unregistered during its turn");
        }

        if outcome? == BudgetOutcome::Exhausted {
            tracing::trace!(%priority, "budget exhausted, yielding");
            return Ok(BudgetOutcome::Exhausted);
        }
    }

    Ok(BudgetOutcome::Drained)
}

/// Run tasks from one queue in insertion order until it is empty or the window is
/// spent. The budget is checked before every task; a task that has started always
/// runs to completion.
pub(crate) fn run_turn<H: Host>(
    queue: &TaskQueue,
    host: &H,
    priority: PriorityLevel,
    window: BudgetWindow,
) -> Result<BudgetOutcome, SchedulerError> {
    let mut cursor = queue.cursor();
    let mut ran = 0usize;

    loop {
        let now = host.now();
        if window.is_spent(now) {
            break;
        }
        let Some(task) = cursor.current() else {
            tracing::trace!(%priority, ran, remaining_ms = window.remaining(now), "queue drained");
            return Ok(BudgetOutcome::Drained);
        };

        run_task(&task, priority)?;
        cursor.remove_current();
        ran += 1;
    }

    tracing::trace!(%priority, ran, left = queue.len(), "turn ended by budget");
    Ok(BudgetOutcome::Exhausted)
}

/// Run one task, refusing to start it again if it is already on the stack.
pub(crate) fn run_task(task: &Task, priority: PriorityLevel) -> Result<(), SchedulerError> {
    match task.try_run() {
        Some(result) => result.map_err(|source| SchedulerError::Task {
            priority,
            task: task.id(),
            source,
        }),
        None => Err(SchedulerError::Reentrant {
            priority,
            task: task.id(),
        }),
    }
}
